//! The closed family of physical types the typed column readers are generic over.
//!
//! Each marker type ([`Int32Type`], [`ByteArrayType`], ...) ties a [`PhysicalType`]
//! tag to its in-memory value type and to the decoding routines for that type.

use std::fmt;

use bytes::Bytes;
use parcel_common::{Result, error::Error};
use parcel_format::PhysicalType;

use crate::{plain::PlainDecoder, rle::RleDecoder};

/// A physical type marker.
pub trait DataType: Send + 'static {
    /// In-memory representation of a single value.
    type Value: Clone + Default + fmt::Debug + PartialEq + Send + Sync + 'static;

    /// The physical type tag this marker stands for.
    const PHYSICAL_TYPE: PhysicalType;

    /// Fewest bits a single plain-encoded value can occupy.
    fn min_plain_bits(type_length: i32) -> usize;

    /// Decodes `out.len()` plain-encoded values.
    fn decode_plain(decoder: &mut PlainDecoder, out: &mut [Self::Value]) -> Result<()>;

    /// Decodes `out.len()` values from a bit width 1 hybrid stream.
    ///
    /// Only defined for booleans.
    fn decode_rle(_decoder: &mut RleDecoder, _out: &mut [Self::Value]) -> Result<()> {
        Err(Error::encoding(format!(
            "RLE value encoding is not supported for {}",
            Self::PHYSICAL_TYPE
        )))
    }
}

macro_rules! data_type {
    ($name:ident, $value:ty, $physical:ident, $decode:ident, |$len:ident| $bits:expr) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl DataType for $name {
            type Value = $value;
            const PHYSICAL_TYPE: PhysicalType = PhysicalType::$physical;

            fn min_plain_bits($len: i32) -> usize {
                $bits
            }

            #[inline]
            fn decode_plain(decoder: &mut PlainDecoder, out: &mut [$value]) -> Result<()> {
                decoder.$decode(out)
            }
        }
    };
}

data_type!(Int32Type, i32, Int32, decode_i32, |_len| 32);
data_type!(Int64Type, i64, Int64, decode_i64, |_len| 64);
data_type!(Int96Type, Int96, Int96, decode_int96, |_len| 96);
data_type!(FloatType, f32, Float, decode_f32, |_len| 32);
data_type!(DoubleType, f64, Double, decode_f64, |_len| 64);
// The 4-byte length prefix of an empty value.
data_type!(ByteArrayType, ByteArray, ByteArray, decode_byte_array, |_len| 32);
data_type!(
    FixedLenByteArrayType,
    FixedLenByteArray,
    FixedLenByteArray,
    decode_fixed_len_byte_array,
    |len| len.max(0) as usize * 8
);

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolType;

impl DataType for BoolType {
    type Value = bool;
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Boolean;

    fn min_plain_bits(_type_length: i32) -> usize {
        1
    }

    fn decode_plain(decoder: &mut PlainDecoder, out: &mut [bool]) -> Result<()> {
        decoder.decode_bool(out)
    }

    fn decode_rle(decoder: &mut RleDecoder, out: &mut [bool]) -> Result<()> {
        let decoded = decoder.get_batch(out);
        if decoded < out.len() {
            return Err(Error::short_read(
                "RLE BOOLEAN values",
                out.len(),
                decoded,
            ));
        }
        Ok(())
    }
}

/// Deprecated 12-byte value, conventionally a timestamp: nanoseconds within the day
/// in the first eight bytes and the Julian day number in the last four.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Int96([u32; 3]);

impl Int96 {
    const JULIAN_DAY_OF_EPOCH: i64 = 2_440_588;
    const NANOS_PER_DAY: i64 = 86_400 * 1_000_000_000;

    pub fn new(data: [u32; 3]) -> Int96 {
        Int96(data)
    }

    pub fn data(&self) -> &[u32; 3] {
        &self.0
    }

    /// Interprets the value as a timestamp and returns nanoseconds since the Unix epoch.
    pub fn to_unix_nanos(&self) -> i64 {
        let nanos_of_day = ((self.0[1] as u64) << 32 | self.0[0] as u64) as i64;
        let days = self.0[2] as i64 - Self::JULIAN_DAY_OF_EPOCH;
        days.wrapping_mul(Self::NANOS_PER_DAY)
            .wrapping_add(nanos_of_day)
    }
}

impl From<[u32; 3]> for Int96 {
    fn from(data: [u32; 3]) -> Int96 {
        Int96(data)
    }
}

impl fmt::Debug for Int96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Int96({} {} {})", self.0[0], self.0[1], self.0[2])
    }
}

impl fmt::Display for Int96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0[0], self.0[1], self.0[2])
    }
}

/// A variable-length byte string, usually a zero-copy view into a page buffer.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteArray(Bytes);

impl ByteArray {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the bytes are not valid UTF-8.
    pub fn as_utf8(&self) -> Result<&str> {
        std::str::from_utf8(&self.0)
            .map_err(|e| Error::invalid_format("BYTE_ARRAY", e.to_string()))
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Bytes> for ByteArray {
    fn from(bytes: Bytes) -> ByteArray {
        ByteArray(bytes)
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(bytes: Vec<u8>) -> ByteArray {
        ByteArray(Bytes::from(bytes))
    }
}

impl From<&str> for ByteArray {
    fn from(s: &str) -> ByteArray {
        ByteArray(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "ByteArray({s:?})"),
            Err(_) => write!(f, "ByteArray({:?})", self.0.as_ref()),
        }
    }
}

impl fmt::Display for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A byte string whose width is fixed by the column descriptor.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedLenByteArray(ByteArray);

impl FixedLenByteArray {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Bytes> for FixedLenByteArray {
    fn from(bytes: Bytes) -> FixedLenByteArray {
        FixedLenByteArray(ByteArray(bytes))
    }
}

impl From<Vec<u8>> for FixedLenByteArray {
    fn from(bytes: Vec<u8>) -> FixedLenByteArray {
        FixedLenByteArray(ByteArray::from(bytes))
    }
}

impl fmt::Debug for FixedLenByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedLenByteArray({:?})", self.as_bytes())
    }
}
