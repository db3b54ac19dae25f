use core::fmt;

use anyhow::Result;

use crate::{
    algorithms::{DynMutator, huffman, lz77},
    mutator::Mutator,
};

#[derive(Debug, Clone, Copy)]
pub struct RegisteredCompressor {
    pub mutator: DynMutator,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub short_description: Option<&'static str>,
}

impl RegisteredCompressor {
    pub const fn new_dyn(
        mutator: DynMutator,
        name: &'static str,
        aliases: &'static [&'static str],
        short_description: Option<&'static str>,
    ) -> Self {
        RegisteredCompressor {
            mutator,
            name,
            aliases,
            short_description,
        }
    }

    /// Whether `s` names this compressor, either by its registered name or one of its aliases.
    pub fn answers_to(&self, s: &str) -> bool {
        self.name == s || self.aliases.contains(&s)
    }
}

impl fmt::Display for RegisteredCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Algorithms that are available in the current build.
#[rustfmt::skip]
pub static ALL_COMPRESSORS: &[RegisteredCompressor] = &[
    lz77::Lz77,
    huffman::HuffmanCoding,
];

pub fn get_specific_compressor_from_name(s: &str) -> Option<RegisteredCompressor> {
    ALL_COMPRESSORS.iter().find(|comp| comp.answers_to(s)).copied()
}

impl Mutator for RegisteredCompressor {
    fn drive_mutation(&mut self, data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
        if_tracing! {
            let span = tracing::span!(tracing::Level::DEBUG, "registered compressor", name = self.name);
            let _span = span.enter();
        }
        self.mutator.drive_mutation(data, buf)
    }

    fn revert_mutation(&mut self, data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
        if_tracing! {
            let span = tracing::span!(tracing::Level::DEBUG, "registered decompressor", name = self.name);
            let _span = span.enter();
        }
        self.mutator.revert_mutation(data, buf)
    }
}
