//! MSB-first bit packing for the huffman payload.

use super::tree::Code;

/// Appends bits to the end of a byte buffer, most significant bit first.
pub struct BitWriter<'a> {
    out: &'a mut Vec<u8>,
    current: u8,
    filled: u8,
}

impl<'a> BitWriter<'a> {
    pub fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out, current: 0, filled: 0 }
    }

    #[inline]
    pub fn push_bit(&mut self, bit: bool) {
        self.current = (self.current << 1) | u8::from(bit);
        self.filled += 1;
        if self.filled == 8 {
            self.out.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    #[inline]
    pub fn write_code(&mut self, code: Code) {
        for i in (0..code.len()).rev() {
            self.push_bit((code.bits() >> i) & 1 == 1);
        }
    }

    /// Flushes the partial byte, left-aligned, and returns how many of its high bits are meaningful.
    ///
    /// A stream whose length is a multiple of 8 reports 8, never 0.
    pub fn finish(self) -> u8 {
        if self.filled == 0 {
            return 8;
        }
        self.out.push(self.current << (8 - self.filled));
        self.filled
    }
}

/// Iterates the bits of a payload, most significant bit first, honoring the usable bit count
/// of the last byte.
pub struct BitReader<'a> {
    payload: &'a [u8],
    position: usize,
    total_bits: usize,
}

impl<'a> BitReader<'a> {
    /// `usable_bits` must be in `1..=8`.
    pub fn new(payload: &'a [u8], usable_bits: u8) -> Self {
        debug_assert!((1..=8).contains(&usable_bits));
        let total_bits = match payload.len() {
            0 => 0,
            n => (n - 1) * 8 + usable_bits as usize,
        };
        Self {
            payload,
            position: 0,
            total_bits,
        }
    }

    pub const fn remaining(&self) -> usize {
        self.total_bits - self.position
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<bool> {
        if self.position >= self.total_bits {
            return None;
        }
        let byte = self.payload[self.position / 8];
        let bit = (byte >> (7 - self.position % 8)) & 1 == 1;
        self.position += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_byte_is_left_aligned() {
        let mut out = vec![];
        let mut writer = BitWriter::new(&mut out);
        for bit in [true, false, true] {
            writer.push_bit(bit);
        }
        assert_eq!(writer.finish(), 3);
        assert_eq!(out, [0b1010_0000]);
    }

    #[test]
    fn whole_bytes_report_eight_usable_bits() {
        let mut out = vec![];
        let mut writer = BitWriter::new(&mut out);
        for _ in 0..16 {
            writer.push_bit(true);
        }
        assert_eq!(writer.finish(), 8);
        assert_eq!(out, [0xFF, 0xFF]);
    }

    #[test]
    fn reader_stops_at_usable_bits() {
        let bits: Vec<bool> = BitReader::new(&[0b1100_0000, 0b1010_0000], 3).collect();
        assert_eq!(bits, [true, true, false, false, false, false, false, false, true, false, true]);
    }

    #[test]
    fn empty_payload_has_no_bits() {
        assert_eq!(BitReader::new(&[], 8).count(), 0);
    }
}
