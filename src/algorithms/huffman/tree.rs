use core::cmp::{Ordering, Reverse};
use core::fmt;
use std::collections::BinaryHeap;

use crate::error::EncodeError;

pub const ALPHABET_SIZE: usize = 256;

/// Occurrence count of every byte value in a buffer.
///
/// Iteration is always in ascending byte order, which is also the order the table is serialized in.
#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u32; ALPHABET_SIZE],
}

impl FrequencyTable {
    pub const fn new() -> Self {
        Self {
            counts: [0; ALPHABET_SIZE],
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, EncodeError> {
        let mut wide = [0u64; ALPHABET_SIZE];
        for &byte in data {
            wide[byte as usize] += 1;
        }

        let mut table = Self::new();
        for (byte, &count) in wide.iter().enumerate() {
            table.counts[byte] = u32::try_from(count).map_err(|_| EncodeError::FrequencyOverflow { byte: byte as u8, count })?;
        }
        Ok(table)
    }

    pub fn set(&mut self, byte: u8, count: u32) {
        self.counts[byte as usize] = count;
    }

    /// Present symbols and their counts, ascending by byte value.
    pub fn symbols(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count != 0)
            .map(|(byte, &count)| (byte as u8, count))
    }

    /// Number of distinct byte values present.
    pub fn len(&self) -> usize {
        self.counts.iter().filter(|&&count| count != 0).count()
    }

    /// Sum of all counts, i.e. the length of the buffer the table describes.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&count| u64::from(count)).sum()
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.symbols()).finish()
    }
}

/// A node in a huffman tree. Children are exclusively owned by their parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        byte: u8,
        freq: u64,
    },
    Internal {
        /// The byte of the leftmost leaf below this node. Only used to order merges.
        byte: u8,
        freq: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub const fn freq(&self) -> u64 {
        match self {
            HuffNode::Leaf { freq, .. } | HuffNode::Internal { freq, .. } => *freq,
        }
    }

    pub const fn byte(&self) -> u8 {
        match self {
            HuffNode::Leaf { byte, .. } | HuffNode::Internal { byte, .. } => *byte,
        }
    }

    #[cfg(test)]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }

    /// Merge order: lower frequency first, then lower byte value.
    ///
    /// No two live nodes share a key, since every byte value belongs to exactly one subtree.
    const fn key(&self) -> (u64, u8) {
        (self.freq(), self.byte())
    }

    fn merge(left: HuffNode, right: HuffNode) -> HuffNode {
        HuffNode::Internal {
            byte: left.byte(),
            freq: left.freq() + right.freq(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Heap entry ordering nodes by [`HuffNode::key`] alone.
struct ByKey(HuffNode);

impl PartialEq for ByKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.key() == other.0.key()
    }
}

impl Eq for ByKey {}

impl PartialOrd for ByKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key().cmp(&other.0.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffNode,
}

impl HuffmanTree {
    /// Builds the tree for a frequency table. Returns `None` if the table is empty.
    ///
    /// Both the encoder and the decoder call this, and the decoder only ever sees the frequency
    /// table, so the result must depend on nothing but the table.
    pub fn from_frequencies(frequencies: &FrequencyTable) -> Option<Self> {
        let mut heap: BinaryHeap<Reverse<ByKey>> = frequencies
            .symbols()
            .map(|(byte, count)| {
                Reverse(ByKey(HuffNode::Leaf {
                    byte,
                    freq: u64::from(count),
                }))
            })
            .collect();

        loop {
            let Reverse(ByKey(left)) = heap.pop()?;
            let Some(Reverse(ByKey(right))) = heap.pop() else {
                return Some(HuffmanTree { root: left });
            };
            heap.push(Reverse(ByKey(HuffNode::merge(left, right))));
        }
    }

    pub const fn root(&self) -> &HuffNode {
        &self.root
    }

    /// Derives the code of every leaf: `0` for a left step, `1` for a right step.
    ///
    /// A tree that is a single leaf gets the one-bit code `0`.
    pub fn code_table(&self) -> CodeTable {
        let mut table = CodeTable::empty();
        match &self.root {
            HuffNode::Leaf { byte, .. } => table.codes[*byte as usize] = Some(Code::EMPTY.push(false)),
            internal => assign_codes(internal, Code::EMPTY, &mut table),
        }
        table
    }
}

fn assign_codes(node: &HuffNode, prefix: Code, table: &mut CodeTable) {
    match node {
        HuffNode::Leaf { byte, .. } => table.codes[*byte as usize] = Some(prefix),
        HuffNode::Internal { left, right, .. } => {
            assign_codes(left, prefix.push(false), table);
            assign_codes(right, prefix.push(true), table);
        }
    }
}

/// A root-to-leaf path, stored in the low `len` bits of `bits` with the first step most significant.
///
/// Frequencies are at most `u32::MAX` over 256 symbols, which bounds the tree depth well below 64.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    bits: u64,
    len: u8,
}

impl Code {
    pub const EMPTY: Code = Code { bits: 0, len: 0 };

    #[must_use]
    pub const fn push(self, bit: bool) -> Code {
        debug_assert!(self.len < 64);
        Code {
            bits: (self.bits << 1) | bit as u64,
            len: self.len + 1,
        }
    }

    pub const fn bits(self) -> u64 {
        self.bits
    }

    pub const fn len(self) -> u8 {
        self.len
    }

    /// Whether `self` is a prefix of `other`. Every code is a prefix of itself.
    #[cfg(test)]
    pub const fn is_prefix_of(self, other: Code) -> bool {
        self.len <= other.len && other.bits >> (other.len - self.len) == self.bits
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len).rev() {
            f.write_str(if (self.bits >> i) & 1 == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({})", self)
    }
}

/// Maps every present byte value to its code.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<Code>; ALPHABET_SIZE],
}

impl CodeTable {
    const fn empty() -> Self {
        Self {
            codes: [None; ALPHABET_SIZE],
        }
    }

    #[inline]
    pub const fn get(&self, byte: u8) -> Option<Code> {
        self.codes[byte as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(byte, code)| code.map(|code| (byte as u8, code)))
    }
}

impl fmt::Debug for CodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes_of(data: &[u8]) -> Vec<(u8, String)> {
        let frequencies = FrequencyTable::from_bytes(data).unwrap();
        let tree = HuffmanTree::from_frequencies(&frequencies).unwrap();
        tree.code_table().iter().map(|(byte, code)| (byte, code.to_string())).collect()
    }

    #[test]
    fn empty_table_has_no_tree() {
        assert!(HuffmanTree::from_frequencies(&FrequencyTable::new()).is_none());
    }

    #[test]
    fn single_symbol_gets_code_zero() {
        let frequencies = FrequencyTable::from_bytes(b"AAAAAAAAAA").unwrap();
        let tree = HuffmanTree::from_frequencies(&frequencies).unwrap();
        assert!(tree.root().is_leaf());
        assert_eq!(codes_of(b"AAAAAAAAAA"), [(b'A', "0".to_string())]);
    }

    #[test]
    fn equal_frequencies_break_ties_by_byte() {
        let expected = [
            (b'a', "00".to_string()),
            (b'b', "01".to_string()),
            (b'c', "10".to_string()),
            (b'd', "11".to_string()),
        ];
        assert_eq!(codes_of(b"dcba"), expected);
        assert_eq!(codes_of(b"abcd"), expected);
    }

    #[test]
    fn merged_node_inherits_leftmost_byte() {
        // a and b merge into (2, 'a'), which then sorts before c (2, 'c').
        let expected = [(b'a', "00".to_string()), (b'b', "01".to_string()), (b'c', "1".to_string())];
        assert_eq!(codes_of(b"abcc"), expected);

        let frequencies = FrequencyTable::from_bytes(b"abcc").unwrap();
        let tree = HuffmanTree::from_frequencies(&frequencies).unwrap();
        match tree.root() {
            HuffNode::Internal { byte, freq, left, .. } => {
                assert_eq!((*byte, *freq), (b'a', 4));
                assert_eq!((left.byte(), left.freq()), (b'a', 2));
            }
            leaf => panic!("expected an internal root, got {:?}", leaf),
        }
    }

    #[test]
    fn frequent_symbols_get_shorter_codes() {
        let codes = codes_of(b"eeeeeeeeeeeeeeeettttaoi");
        let len_of = |b: u8| codes.iter().find(|(byte, _)| *byte == b).unwrap().1.len();
        assert!(len_of(b'e') <= len_of(b't'));
        assert!(len_of(b't') <= len_of(b'i'));
    }

    #[test]
    fn codes_are_prefix_free() {
        for (data, _) in crate::tests::test_cases() {
            let Ok(frequencies) = FrequencyTable::from_bytes(&data) else { continue };
            let Some(tree) = HuffmanTree::from_frequencies(&frequencies) else { continue };
            let table = tree.code_table();
            for (x, cx) in table.iter() {
                for (y, cy) in table.iter() {
                    if x != y {
                        assert!(!cx.is_prefix_of(cy), "code of {:#04x} ({}) prefixes code of {:#04x} ({})", x, cx, y, cy);
                    }
                }
            }
        }
    }

    #[test]
    fn tree_shape_depends_only_on_frequencies() {
        let a = FrequencyTable::from_bytes(b"mississippi river").unwrap();
        let b = FrequencyTable::from_bytes(b"rrevi ppiissssmii").unwrap();
        assert_eq!(a, b);
        assert_eq!(HuffmanTree::from_frequencies(&a), HuffmanTree::from_frequencies(&b));
    }

    #[test]
    fn full_alphabet_is_a_strict_binary_tree() {
        fn count(node: &HuffNode) -> (usize, usize) {
            match node {
                HuffNode::Leaf { .. } => (1, 0),
                HuffNode::Internal { left, right, .. } => {
                    let (ll, li) = count(left);
                    let (rl, ri) = count(right);
                    (ll + rl, li + ri + 1)
                }
            }
        }

        let data: Vec<u8> = (0..=255u8).collect();
        let frequencies = FrequencyTable::from_bytes(&data).unwrap();
        assert_eq!(frequencies.len(), 256);
        let tree = HuffmanTree::from_frequencies(&frequencies).unwrap();
        assert_eq!(count(tree.root()), (256, 255));
        assert_eq!(tree.root().freq(), 256);
        assert!(tree.code_table().iter().all(|(_, code)| code.len() == 8));
    }

    #[test]
    fn prefix_check() {
        let zero = Code::EMPTY.push(false);
        let zero_one = zero.push(true);
        assert!(zero.is_prefix_of(zero_one));
        assert!(!zero_one.is_prefix_of(zero));
        assert!(!Code::EMPTY.push(true).is_prefix_of(zero_one));
    }
}
