//! Static huffman coding over the byte alphabet.
//!
//! Container layout:
//!
//! | offset | field           | size            |
//! |--------|-----------------|-----------------|
//! | 0      | usable bits     | 1               |
//! | 1      | table size      | 1               |
//! | 2      | frequency table | table size × 5  |
//! | ..     | payload         | remaining bytes |
//!
//! The usable bit count says how many high bits of the last payload byte are meaningful, and is
//! always in `1..=8`. The table size is the number of distinct bytes, where a full 256-symbol
//! alphabet is written as `0`. Every table entry is a byte value followed by its count as a
//! little-endian `u32`, in ascending byte order. The decoder rebuilds the tree from the table alone.
//!
//! An empty input encodes to an empty container and vice versa.

use anyhow::{Result, anyhow};

use crate::{
    algorithms::DynMutator,
    error::DecompressionError,
    registered::RegisteredCompressor,
};

mod bits;
pub mod tree;

use self::{
    bits::{BitReader, BitWriter},
    tree::{ALPHABET_SIZE, FrequencyTable, HuffNode, HuffmanTree},
};

if_tracing! {
    use tracing::{debug, info};
}

pub const HuffmanCoding: RegisteredCompressor = RegisteredCompressor::new_dyn(
    DynMutator {
        drive_mutation: huffman_encode,
        revert_mutation: huffman_decode,
    },
    "huffman",
    &["huff"],
    Some(DESCRIPTION),
);
const DESCRIPTION: &str = "Static huffman coding with a byte frequency table header.";

const HEADER_LEN: usize = 2;
const ENTRY_LEN: usize = 5;

/// Table size as stored in the header. A full alphabet does not fit in a byte, so it is stored as 0.
const fn encode_table_size(distinct: usize) -> u8 {
    debug_assert!(distinct >= 1 && distinct <= ALPHABET_SIZE);
    if distinct == ALPHABET_SIZE { 0 } else { distinct as u8 }
}

const fn decode_table_size(stored: u8) -> usize {
    if stored == 0 { ALPHABET_SIZE } else { stored as usize }
}

pub fn huffman_encode(data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    if_tracing! {
        debug!(target = "huffman", input_len = data.len(), "huffman encode start");
    }
    buf.clear();
    if data.is_empty() {
        if_tracing! {
            debug!(target = "huffman", "huffman encode passthrough: input empty");
        }
        return Ok(());
    }

    let frequencies = FrequencyTable::from_bytes(data)?;
    let tree = HuffmanTree::from_frequencies(&frequencies)
        .ok_or_else(|| anyhow!("internal error: no huffman tree for a non-empty input"))?;
    let codes = tree.code_table();

    let distinct = frequencies.len();
    buf.reserve(HEADER_LEN + distinct * ENTRY_LEN + data.len() / 2);
    // usable bit count is patched in once the payload is written
    buf.push(0);
    buf.push(encode_table_size(distinct));
    for (byte, count) in frequencies.symbols() {
        buf.push(byte);
        buf.extend_from_slice(&count.to_le_bytes());
    }

    let mut writer = BitWriter::new(buf);
    for &byte in data {
        let code = codes
            .get(byte)
            .ok_or_else(|| anyhow!("internal error: no huffman code for byte {:#04x}", byte))?;
        writer.write_code(code);
    }
    let usable_bits = writer.finish();
    buf[0] = usable_bits;

    if_tracing! {
        info!(target = "huffman", input_len = data.len(), output_len = buf.len(), distinct, usable_bits, "huffman encode complete");
    }
    Ok(())
}

/// Parsed container header.
#[derive(Debug)]
struct Header<'a> {
    usable_bits: u8,
    frequencies: FrequencyTable,
    payload: &'a [u8],
}

impl<'a> Header<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, DecompressionError> {
        let (&[usable_bits, stored_size], rest) = data
            .split_first_chunk::<HEADER_LEN>()
            .ok_or(DecompressionError::TruncatedHeader("huffman"))?;

        if !(1..=8).contains(&usable_bits) {
            return Err(DecompressionError::InvalidHeader(format!(
                "usable bit count must be between 1 and 8, got {}",
                usable_bits
            )));
        }

        let distinct = decode_table_size(stored_size);
        let (table, payload) = rest
            .split_at_checked(distinct * ENTRY_LEN)
            .ok_or(DecompressionError::TruncatedHeader("huffman frequency table"))?;

        let mut frequencies = FrequencyTable::new();
        let mut previous: Option<u8> = None;
        for entry in table.chunks_exact(ENTRY_LEN) {
            let byte = entry[0];
            let count = u32::from_le_bytes([entry[1], entry[2], entry[3], entry[4]]);
            if previous.is_some_and(|p| p >= byte) {
                return Err(DecompressionError::InvalidHeader(format!(
                    "frequency table is not in strictly ascending byte order at {:#04x}",
                    byte
                )));
            }
            if count == 0 {
                return Err(DecompressionError::InvalidHeader(format!("byte {:#04x} has a zero frequency", byte)));
            }
            frequencies.set(byte, count);
            previous = Some(byte);
        }

        Ok(Header {
            usable_bits,
            frequencies,
            payload,
        })
    }
}

pub fn huffman_decode(data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    if_tracing! {
        debug!(target = "huffman", input_len = data.len(), "huffman decode start");
    }
    buf.clear();
    if data.is_empty() {
        if_tracing! {
            debug!(target = "huffman", "huffman decode passthrough: input empty");
        }
        return Ok(());
    }

    let decoded = Header::parse(data).and_then(|header| {
        let tree = HuffmanTree::from_frequencies(&header.frequencies)
            .ok_or_else(|| DecompressionError::InvalidHeader("frequency table is empty".to_string()))?;
        let bits = BitReader::new(header.payload, header.usable_bits);
        decode_payload(&tree, bits, header.frequencies.total(), buf)
    });

    if let Err(err) = decoded {
        if_tracing! {
            tracing::error!(target = "huffman", error = %err, "huffman decode failed");
        }
        return Err(err.into());
    }

    if_tracing! {
        info!(target = "huffman", input_len = data.len(), output_len = buf.len(), "huffman decode complete");
    }
    Ok(())
}

/// Walks the tree once per payload bit, emitting a byte at every leaf.
fn decode_payload(tree: &HuffmanTree, bits: BitReader<'_>, expected: u64, buf: &mut Vec<u8>) -> Result<(), DecompressionError> {
    // each emitted byte consumes at least one bit
    let capacity = expected.min(bits.remaining() as u64);
    buf.reserve(capacity as usize);

    let overrun = || DecompressionError::CorruptStream(format!("payload encodes more than the {} bytes in the frequency table", expected));
    let mut produced: u64 = 0;
    let root = tree.root();

    if let HuffNode::Leaf { byte, .. } = *root {
        for bit in bits {
            if bit {
                return Err(DecompressionError::CorruptStream(
                    "one-bit in a single-symbol stream".to_string(),
                ));
            }
            if produced == expected {
                return Err(overrun());
            }
            buf.push(byte);
            produced += 1;
        }
    } else {
        let mut current = root;
        for bit in bits {
            let HuffNode::Internal { left, right, .. } = current else {
                return Err(DecompressionError::CorruptStream("tree walk ran past a leaf".to_string()));
            };
            let next: &HuffNode = if bit { &**right } else { &**left };
            match *next {
                HuffNode::Leaf { byte, .. } => {
                    if produced == expected {
                        return Err(overrun());
                    }
                    buf.push(byte);
                    produced += 1;
                    current = root;
                }
                HuffNode::Internal { .. } => current = next,
            }
        }
        if !core::ptr::eq(current, root) {
            return Err(DecompressionError::CorruptStream("payload ends inside a code".to_string()));
        }
    }

    if produced != expected {
        return Err(DecompressionError::LengthMismatch {
            expected,
            actual: produced,
        });
    }
    Ok(())
}
