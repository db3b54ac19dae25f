//! Byte-oriented LZ77 with a 255 byte window.
//!
//! The output is a headerless sequence of 3 byte tuples `(distance, length, literal)`: copy
//! `length` bytes starting `distance` bytes back in the output, then append `literal`. A tuple
//! without a match has length 0 and distance 0.

use core::fmt;

use anyhow::Result;

use crate::{algorithms::DynMutator, error::DecompressionError, registered::RegisteredCompressor};

if_tracing! {
    use tracing::{debug, info, warn};
}

pub const Lz77: RegisteredCompressor = RegisteredCompressor::new_dyn(
    DynMutator {
        drive_mutation: lz77_encode,
        revert_mutation: lz77_decode,
    },
    "lz77",
    &["lz"],
    Some(DESCRIPTION),
);
const DESCRIPTION: &str = "LZ77 with a 255 byte lookbehind window and fixed 3 byte tuples.";

/// How far back a match may start.
pub const WINDOW_SIZE: usize = 255;
/// Longest match a single tuple can describe.
pub const MAX_MATCH_LEN: usize = 255;
pub const TUPLE_LEN: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Lz77Tuple {
    pub distance: u8,
    pub length: u8,
    pub literal: u8,
}

impl Lz77Tuple {
    pub const fn new(distance: u8, length: u8, literal: u8) -> Self {
        Self { distance, length, literal }
    }

    pub const fn to_bytes(self) -> [u8; TUPLE_LEN] {
        [self.distance, self.length, self.literal]
    }

    pub const fn from_bytes([distance, length, literal]: [u8; TUPLE_LEN]) -> Self {
        Self { distance, length, literal }
    }

    /// Number of output bytes this tuple expands to.
    pub const fn expanded_len(self) -> usize {
        self.length as usize + 1
    }
}

impl fmt::Debug for Lz77Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {:?})", self.distance, self.length, self.literal as char)
    }
}

/// Finds the longest earlier match for the bytes at `pos`, returning `(distance, length)`.
///
/// Distances are tried from 1 upwards and only a strictly longer match replaces the best one, so
/// ties go to the smallest distance. The match is clamped to end before the last byte of `data`,
/// which leaves a literal for the tuple. Returns `(0, 0)` if nothing matches.
pub fn find_longest_match(data: &[u8], pos: usize) -> (usize, usize) {
    let max_len = MAX_MATCH_LEN.min(data.len() - pos - 1);
    let mut best = (0, 0);

    for distance in 1..=WINDOW_SIZE.min(pos) {
        let start = pos - distance;
        let length = (0..max_len)
            .take_while(|&k| data[start + k] == data[pos + k])
            .count();
        if length > best.1 {
            best = (distance, length);
            if length == max_len {
                break;
            }
        }
    }

    best
}

/// Iterates the tuples describing `data`, left to right.
pub struct Tuples<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tuples<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl Iterator for Tuples<'_> {
    type Item = Lz77Tuple;

    fn next(&mut self) -> Option<Lz77Tuple> {
        if self.pos >= self.data.len() {
            return None;
        }
        let (distance, length) = find_longest_match(self.data, self.pos);
        let literal = self.data[self.pos + length];
        self.pos += length + 1;
        // both are bounded by WINDOW_SIZE and MAX_MATCH_LEN
        Some(Lz77Tuple::new(distance as u8, length as u8, literal))
    }
}

pub fn lz77_encode(data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    if_tracing! {
        debug!(target = "lz77", input_len = data.len(), "lz77 encode start");
    }
    buf.clear();

    for tuple in Tuples::new(data) {
        buf.extend_from_slice(&tuple.to_bytes());
    }

    if_tracing! {
        info!(target = "lz77", input_len = data.len(), output_len = buf.len(), tuples = buf.len() / TUPLE_LEN, "lz77 encode complete");
    }
    Ok(())
}

pub fn lz77_decode(data: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    if_tracing! {
        debug!(target = "lz77", input_len = data.len(), "lz77 decode start");
    }
    buf.clear();

    let records = data.chunks_exact(TUPLE_LEN);
    if_tracing! {
        if !records.remainder().is_empty() {
            warn!(target = "lz77", trailing = records.remainder().len(), "ignoring truncated tuple at end of stream");
        }
    }

    for record in records {
        let tuple = Lz77Tuple::from_bytes([record[0], record[1], record[2]]);
        if let Err(err) = replay(tuple, buf) {
            if_tracing! {
                tracing::error!(target = "lz77", output_len = buf.len(), error = %err, "lz77 decode failed");
            }
            return Err(err.into());
        }
    }

    if_tracing! {
        info!(target = "lz77", input_len = data.len(), output_len = buf.len(), "lz77 decode complete");
    }
    Ok(())
}

/// Appends the bytes one tuple stands for. Copies go one byte at a time so that a match may
/// overlap the bytes it is producing.
fn replay(tuple: Lz77Tuple, out: &mut Vec<u8>) -> Result<(), DecompressionError> {
    let length = tuple.length as usize;
    let distance = tuple.distance as usize;

    if length > 0 {
        if distance == 0 || distance > out.len() {
            return Err(DecompressionError::CorruptStream(format!(
                "tuple {:?} reaches back {} bytes with only {} bytes of output",
                tuple,
                distance,
                out.len()
            )));
        }
        let start = out.len() - distance;
        out.reserve(tuple.expanded_len());
        for k in 0..length {
            out.push(out[start + k]);
        }
    }

    out.push(tuple.literal);
    Ok(())
}
