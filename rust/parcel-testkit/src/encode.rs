//! Encoders for the sections of a data page.

use parcel_encodings::{
    bit_util::{BitWriter, bit_width},
    data_type::{ByteArray, FixedLenByteArray, Int96},
    rle::RleEncoder,
};

/// Values that can be written in the `PLAIN` encoding.
pub trait PlainEncode {
    fn encode_plain(values: &[Self], out: &mut Vec<u8>)
    where
        Self: Sized;
}

macro_rules! plain_le {
    ($($ty:ty),*) => {
        $(
            impl PlainEncode for $ty {
                fn encode_plain(values: &[$ty], out: &mut Vec<u8>) {
                    for value in values {
                        out.extend_from_slice(&value.to_le_bytes());
                    }
                }
            }
        )*
    };
}

plain_le!(i32, i64, f32, f64);

impl PlainEncode for bool {
    fn encode_plain(values: &[bool], out: &mut Vec<u8>) {
        let mut writer = BitWriter::new();
        for &value in values {
            writer.put_value(value as u64, 1);
        }
        out.extend_from_slice(&writer.into_inner());
    }
}

impl PlainEncode for Int96 {
    fn encode_plain(values: &[Int96], out: &mut Vec<u8>) {
        for value in values {
            for word in value.data() {
                out.extend_from_slice(&word.to_le_bytes());
            }
        }
    }
}

impl PlainEncode for ByteArray {
    fn encode_plain(values: &[ByteArray], out: &mut Vec<u8>) {
        for value in values {
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
            out.extend_from_slice(value.as_bytes());
        }
    }
}

impl PlainEncode for FixedLenByteArray {
    fn encode_plain(values: &[FixedLenByteArray], out: &mut Vec<u8>) {
        for value in values {
            out.extend_from_slice(value.as_bytes());
        }
    }
}

pub fn plain<V: PlainEncode>(values: &[V]) -> Vec<u8> {
    let mut out = Vec::new();
    V::encode_plain(values, &mut out);
    out
}

/// Hybrid-encoded levels without a length prefix, as stored in data pages v2.
pub fn rle_levels(max_level: i16, levels: &[i16]) -> Vec<u8> {
    RleEncoder::encode(
        bit_width(max_level as u64),
        levels.iter().map(|&level| level as u64),
    )
}

/// Hybrid-encoded levels behind a 4-byte little-endian length, as stored in data
/// pages v1.
pub fn rle_levels_v1(max_level: i16, levels: &[i16]) -> Vec<u8> {
    length_prefixed(rle_levels(max_level, levels))
}

/// Levels in the deprecated `BIT_PACKED` encoding.
pub fn bit_packed_levels(max_level: i16, levels: &[i16]) -> Vec<u8> {
    let width = bit_width(max_level as u64) as usize;
    let mut writer = BitWriter::new();
    for &level in levels {
        writer.put_value(level as u64, width);
    }
    writer.into_inner()
}

/// Values section of a dictionary-encoded data page: the index bit width byte
/// followed by the hybrid-encoded indices.
pub fn dictionary_indices(dictionary_len: usize, indices: &[u32]) -> Vec<u8> {
    let width = bit_width(dictionary_len.saturating_sub(1) as u64);
    let mut out = vec![width];
    out.extend(RleEncoder::encode(
        width,
        indices.iter().map(|&index| index as u64),
    ));
    out
}

/// Values section of an `RLE` encoded boolean page.
pub fn rle_booleans(values: &[bool]) -> Vec<u8> {
    length_prefixed(RleEncoder::encode(1, values.iter().map(|&v| v as u64)))
}

fn length_prefixed(stream: Vec<u8>) -> Vec<u8> {
    let mut out = (stream.len() as u32).to_le_bytes().to_vec();
    out.extend(stream);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_byte_array() {
        let values = [ByteArray::from("ab"), ByteArray::from("")];
        assert_eq!(plain(&values), [2, 0, 0, 0, b'a', b'b', 0, 0, 0, 0]);
    }

    #[test]
    fn test_bit_packed_levels() {
        assert_eq!(bit_packed_levels(1, &[1, 0, 1, 1]), [0b1101]);
        assert!(bit_packed_levels(0, &[0, 0]).is_empty());
    }
}
