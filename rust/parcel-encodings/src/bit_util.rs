//! Bit-level reading and writing with least-significant-bit-first packing.

use bytes::Bytes;

/// Returns the number of bits needed to represent `max_value`,
/// i.e. `ceil(log2(max_value + 1))`.
#[inline]
pub fn bit_width(max_value: u64) -> u8 {
    (64 - max_value.leading_zeros()) as u8
}

/// Number of bytes needed to hold `bits` bits.
#[inline]
pub fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Reads bit-packed values and byte-aligned integers from a buffer.
///
/// Every read returns `None` without consuming anything when the buffer does not
/// hold enough bits.
#[derive(Clone)]
pub struct BitReader {
    data: Bytes,
    bit_pos: usize,
}

impl BitReader {
    pub fn new(data: Bytes) -> BitReader {
        BitReader { data, bit_pos: 0 }
    }

    /// Reads a `num_bits` wide value (at most 64 bits).
    pub fn get_value(&mut self, num_bits: usize) -> Option<u64> {
        debug_assert!(num_bits <= 64);
        if num_bits == 0 {
            return Some(0);
        }
        if self.bits_left() < num_bits {
            return None;
        }
        let mut value = 0u64;
        let mut read = 0;
        while read < num_bits {
            let byte = self.data[self.bit_pos / 8];
            let bit_offset = self.bit_pos % 8;
            let take = (8 - bit_offset).min(num_bits - read);
            let bits = ((byte >> bit_offset) as u64) & ((1u64 << take) - 1);
            value |= bits << read;
            read += take;
            self.bit_pos += take;
        }
        Some(value)
    }

    /// Skips to the next byte boundary and reads a `num_bytes` little-endian integer.
    pub fn get_aligned(&mut self, num_bytes: usize) -> Option<u64> {
        debug_assert!(num_bytes <= 8);
        let start = self.byte_position();
        let end = start.checked_add(num_bytes)?;
        if end > self.data.len() {
            return None;
        }
        let value = self.data[start..end]
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64);
        self.bit_pos = end * 8;
        Some(value)
    }

    /// Skips to the next byte boundary and reads an unsigned LEB128 integer.
    pub fn get_vlq_int(&mut self) -> Option<u64> {
        let mut pos = self.byte_position();
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = *self.data.get(pos)?;
            pos += 1;
            if shift >= 64 {
                return None;
            }
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        self.bit_pos = pos * 8;
        Some(value)
    }

    /// Current position rounded up to a whole byte.
    pub fn byte_position(&self) -> usize {
        bytes_for_bits(self.bit_pos)
    }

    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.bit_pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.byte_position() >= self.data.len()
    }
}

/// Appends bit-packed values and byte-aligned integers to a growable buffer.
#[derive(Default)]
pub struct BitWriter {
    buffer: Vec<u8>,
    bit_pos: usize,
}

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter::default()
    }

    /// Appends the low `num_bits` bits of `value`.
    pub fn put_value(&mut self, value: u64, num_bits: usize) {
        debug_assert!(num_bits <= 64);
        let mut written = 0;
        while written < num_bits {
            let bit_offset = self.bit_pos % 8;
            if bit_offset == 0 {
                self.buffer.push(0);
            }
            let take = (8 - bit_offset).min(num_bits - written);
            let bits = ((value >> written) & ((1u64 << take) - 1)) as u8;
            if let Some(last) = self.buffer.last_mut() {
                *last |= bits << bit_offset;
            }
            written += take;
            self.bit_pos += take;
        }
    }

    /// Pads to the next byte boundary and appends a `num_bytes` little-endian integer.
    pub fn put_aligned(&mut self, value: u64, num_bytes: usize) {
        self.align();
        self.buffer
            .extend_from_slice(&value.to_le_bytes()[..num_bytes.min(8)]);
        self.bit_pos = self.buffer.len() * 8;
    }

    /// Pads to the next byte boundary and appends an unsigned LEB128 integer.
    pub fn put_vlq_int(&mut self, mut value: u64) {
        self.align();
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buffer.push(byte);
                break;
            }
            self.buffer.push(byte | 0x80);
        }
        self.bit_pos = self.buffer.len() * 8;
    }

    pub fn align(&mut self) {
        self.bit_pos = self.buffer.len() * 8;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_width() {
        assert_eq!(bit_width(0), 0);
        assert_eq!(bit_width(1), 1);
        assert_eq!(bit_width(2), 2);
        assert_eq!(bit_width(3), 2);
        assert_eq!(bit_width(7), 3);
        assert_eq!(bit_width(8), 4);
        assert_eq!(bit_width(u32::MAX as u64), 32);
    }

    #[test]
    fn test_lsb_first_order() {
        // values 1, 2, 3, 4 at width 3: 001 010 011 100 -> 0b10_011_010_001 LSB first
        let mut reader = BitReader::new(Bytes::from_static(&[0b1101_0001, 0b0000_1000]));
        assert_eq!(reader.get_value(3), Some(1));
        assert_eq!(reader.get_value(3), Some(2));
        assert_eq!(reader.get_value(3), Some(3));
        assert_eq!(reader.get_value(3), Some(4));
        assert_eq!(reader.bits_left(), 4);
        assert_eq!(reader.get_value(5), None);
        assert_eq!(reader.bits_left(), 4);
    }

    #[test]
    fn test_writer_reader_agree() {
        let mut rng = fastrand::Rng::with_seed(17);
        let width = 11;
        let values: Vec<u64> = (0..300).map(|_| rng.u64(0..(1 << width))).collect();
        let mut writer = BitWriter::new();
        for &v in &values {
            writer.put_value(v, width);
        }
        writer.put_vlq_int(300);
        writer.put_aligned(0xabcd, 2);

        let mut reader = BitReader::new(Bytes::from(writer.into_inner()));
        for &v in &values {
            assert_eq!(reader.get_value(width), Some(v));
        }
        assert_eq!(reader.get_vlq_int(), Some(300));
        assert_eq!(reader.get_aligned(2), Some(0xabcd));
        assert!(reader.is_exhausted());
        assert_eq!(reader.get_aligned(1), None);
        assert_eq!(reader.get_vlq_int(), None);
    }
}
