pub use anyhow::Result;

/// A reversible transformation over a byte buffer.
///
/// Implementations clear `buf` before writing, so a buffer can be reused across calls.
/// If a call fails, the contents of `buf` are unspecified and should be discarded.
pub trait Mutator {
    fn drive_mutation(&mut self, data: &[u8], buf: &mut Vec<u8>) -> Result<()>;
    fn revert_mutation(&mut self, data: &[u8], buf: &mut Vec<u8>) -> Result<()>;
}
