//! Plain encoding: values stored back to back in their natural little-endian form.
//!
//! - fixed-width numbers: 4, 8 or 12 (INT96) bytes each;
//! - booleans: bit-packed, LSB first;
//! - byte arrays: a 4-byte little-endian length followed by the bytes;
//! - fixed-length byte arrays: `type_length` bytes each.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use parcel_common::{Result, error::Error};

use crate::data_type::{ByteArray, FixedLenByteArray, Int96};

/// Cursor over a plain-encoded buffer.
///
/// Decoding writes as many complete values as the buffer holds and fails with
/// `ShortRead` if that is fewer than requested; the values written before the
/// overrun are left in the output.
pub struct PlainDecoder {
    data: Bytes,
    bit_pos: usize,
    type_length: usize,
}

impl PlainDecoder {
    /// Creates a decoder over `data`.
    ///
    /// `type_length` is the width of `FIXED_LEN_BYTE_ARRAY` values and is ignored
    /// (may be negative) for other types.
    pub fn new(data: Bytes, type_length: i32) -> PlainDecoder {
        PlainDecoder {
            data,
            bit_pos: 0,
            type_length: type_length.max(0) as usize,
        }
    }

    /// Number of whole bytes not yet consumed.
    pub fn bytes_left(&self) -> usize {
        self.data.len().saturating_sub(self.byte_pos())
    }

    fn byte_pos(&self) -> usize {
        self.bit_pos.div_ceil(8)
    }

    pub fn decode_i32(&mut self, out: &mut [i32]) -> Result<()> {
        let (src, n) = self.take_fixed(4, out.len());
        LittleEndian::read_i32_into(&src, &mut out[..n]);
        self.check_complete("INT32", 4, n, out.len())
    }

    pub fn decode_i64(&mut self, out: &mut [i64]) -> Result<()> {
        let (src, n) = self.take_fixed(8, out.len());
        LittleEndian::read_i64_into(&src, &mut out[..n]);
        self.check_complete("INT64", 8, n, out.len())
    }

    pub fn decode_f32(&mut self, out: &mut [f32]) -> Result<()> {
        let (src, n) = self.take_fixed(4, out.len());
        LittleEndian::read_f32_into(&src, &mut out[..n]);
        self.check_complete("FLOAT", 4, n, out.len())
    }

    pub fn decode_f64(&mut self, out: &mut [f64]) -> Result<()> {
        let (src, n) = self.take_fixed(8, out.len());
        LittleEndian::read_f64_into(&src, &mut out[..n]);
        self.check_complete("DOUBLE", 8, n, out.len())
    }

    pub fn decode_int96(&mut self, out: &mut [Int96]) -> Result<()> {
        let (src, n) = self.take_fixed(12, out.len());
        for (value, chunk) in out[..n].iter_mut().zip(src.chunks_exact(12)) {
            let mut words = [0u32; 3];
            LittleEndian::read_u32_into(chunk, &mut words);
            *value = Int96::from(words);
        }
        self.check_complete("INT96", 12, n, out.len())
    }

    pub fn decode_bool(&mut self, out: &mut [bool]) -> Result<()> {
        let total_bits = self.data.len() * 8;
        let n = out.len().min(total_bits.saturating_sub(self.bit_pos));
        for slot in &mut out[..n] {
            let byte = self.data[self.bit_pos / 8];
            *slot = (byte >> (self.bit_pos % 8)) & 1 == 1;
            self.bit_pos += 1;
        }
        if n < out.len() {
            return Err(Error::short_read(
                "plain BOOLEAN values",
                out.len().div_ceil(8),
                n.div_ceil(8),
            ));
        }
        Ok(())
    }

    pub fn decode_byte_array(&mut self, out: &mut [ByteArray]) -> Result<()> {
        for slot in out.iter_mut() {
            let pos = self.byte_pos();
            let available = self.data.len().saturating_sub(pos);
            if available < 4 {
                return Err(Error::short_read("plain BYTE_ARRAY length", 4, available));
            }
            let len = LittleEndian::read_u32(&self.data[pos..pos + 4]) as usize;
            if available - 4 < len {
                return Err(Error::short_read(
                    "plain BYTE_ARRAY value",
                    len,
                    available - 4,
                ));
            }
            *slot = ByteArray::from(self.data.slice(pos + 4..pos + 4 + len));
            self.bit_pos = (pos + 4 + len) * 8;
        }
        Ok(())
    }

    pub fn decode_fixed_len_byte_array(&mut self, out: &mut [FixedLenByteArray]) -> Result<()> {
        let width = self.type_length;
        if width == 0 {
            return Err(Error::invalid_arg(
                "type_length",
                "FIXED_LEN_BYTE_ARRAY requires a positive width",
            ));
        }
        let (src, n) = self.take_fixed(width, out.len());
        for (i, slot) in out[..n].iter_mut().enumerate() {
            *slot = FixedLenByteArray::from(src.slice(i * width..(i + 1) * width));
        }
        self.check_complete("FIXED_LEN_BYTE_ARRAY", width, n, out.len())
    }

    /// Consumes up to `count` whole values of `width` bytes.
    fn take_fixed(&mut self, width: usize, count: usize) -> (Bytes, usize) {
        let pos = self.byte_pos();
        let n = count.min(self.data.len().saturating_sub(pos) / width);
        let src = self.data.slice(pos..pos + n * width);
        self.bit_pos = (pos + n * width) * 8;
        (src, n)
    }

    fn check_complete(
        &self,
        type_name: &str,
        width: usize,
        decoded: usize,
        requested: usize,
    ) -> Result<()> {
        if decoded < requested {
            return Err(Error::short_read(
                format!("plain {type_name} values"),
                (requested - decoded) * width,
                self.bytes_left(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_numbers() {
        let mut data = Vec::new();
        for v in [1i32, -2, 300] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&2.5f64.to_le_bytes());
        let mut decoder = PlainDecoder::new(Bytes::from(data), -1);
        let mut ints = [0i32; 3];
        decoder.decode_i32(&mut ints).unwrap();
        assert_eq!(ints, [1, -2, 300]);
        let mut doubles = [0f64; 1];
        decoder.decode_f64(&mut doubles).unwrap();
        assert_eq!(doubles, [2.5]);
        assert_eq!(decoder.bytes_left(), 0);
    }

    #[test]
    fn test_decode_short_fixed() {
        let mut data = Vec::new();
        for v in [7i64, 8] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&[1, 2, 3]);
        let mut decoder = PlainDecoder::new(Bytes::from(data), -1);
        let mut out = [0i64; 4];
        let err = decoder.decode_i64(&mut out).unwrap_err();
        assert!(err.is_short_read());
        assert_eq!(&out[..2], &[7, 8]);
    }

    #[test]
    fn test_decode_bool() {
        let mut decoder = PlainDecoder::new(Bytes::from_static(&[0b0000_0101, 0b1]), -1);
        let mut out = [false; 9];
        decoder.decode_bool(&mut out).unwrap();
        assert_eq!(
            out,
            [true, false, true, false, false, false, false, false, true]
        );
        let mut more = [false; 8];
        assert!(decoder.decode_bool(&mut more).unwrap_err().is_short_read());
    }

    #[test]
    fn test_decode_byte_array() {
        let mut data = Vec::new();
        for s in ["hello", "", "parcel"] {
            data.extend_from_slice(&(s.len() as u32).to_le_bytes());
            data.extend_from_slice(s.as_bytes());
        }
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(b"trunc");
        let mut decoder = PlainDecoder::new(Bytes::from(data), -1);
        let mut out = vec![ByteArray::default(); 3];
        decoder.decode_byte_array(&mut out).unwrap();
        assert_eq!(out[0].as_bytes(), b"hello");
        assert!(out[1].is_empty());
        assert_eq!(out[2].as_utf8().unwrap(), "parcel");

        let mut out = vec![ByteArray::default(); 1];
        assert!(decoder.decode_byte_array(&mut out).unwrap_err().is_short_read());
    }

    #[test]
    fn test_decode_fixed_len_and_int96() {
        let mut decoder = PlainDecoder::new(Bytes::from_static(b"abcdefgh"), 4);
        let mut out = vec![FixedLenByteArray::default(); 2];
        decoder.decode_fixed_len_byte_array(&mut out).unwrap();
        assert_eq!(out[1].as_bytes(), b"efgh");

        let mut data = Vec::new();
        for w in [1u32, 2, 3] {
            data.extend_from_slice(&w.to_le_bytes());
        }
        let mut decoder = PlainDecoder::new(Bytes::from(data), -1);
        let mut out = [Int96::default(); 1];
        decoder.decode_int96(&mut out).unwrap();
        assert_eq!(out[0].data(), &[1, 2, 3]);
    }
}
