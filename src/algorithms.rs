use crate::mutator::{Mutator, Result};

pub mod huffman;
pub mod lz77;
pub mod pipeline;

/// A stage described by a pair of plain functions.
#[derive(Clone, Copy, Debug)]
pub struct DynMutator {
    pub drive_mutation: fn(data: &[u8], buf: &mut Vec<u8>) -> Result<()>,
    pub revert_mutation: fn(data: &[u8], buf: &mut Vec<u8>) -> Result<()>,
}

impl Mutator for DynMutator {
    fn drive_mutation(&mut self, data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
        (self.drive_mutation)(data, buf)
    }

    fn revert_mutation(&mut self, data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
        (self.revert_mutation)(data, buf)
    }
}
