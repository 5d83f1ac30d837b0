//! Hybrid run-length / bit-packed encoding.
//!
//! The stream is a sequence of runs, each introduced by a ULEB128 header:
//! - `header & 1 == 0`: a repeated run of `header >> 1` copies of one value stored in
//!   `ceil(bit_width / 8)` little-endian bytes;
//! - `header & 1 == 1`: a literal run of `(header >> 1) * 8` values bit-packed
//!   LSB-first at `bit_width` bits each.

use bytes::Bytes;
use parcel_common::{Result, error::Error};

use crate::bit_util::{BitReader, BitWriter, bytes_for_bits};

/// Integer types a hybrid stream can be decoded into.
pub trait RleValue: Copy + Default {
    fn from_u64(value: u64) -> Self;
}

macro_rules! impl_rle_value {
    ($($t:ty),*) => {
        $(
            impl RleValue for $t {
                #[inline]
                fn from_u64(value: u64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_rle_value!(i16, i32, u32, u64, usize);

impl RleValue for bool {
    #[inline]
    fn from_u64(value: u64) -> Self {
        value != 0
    }
}

/// Resumable decoder of a hybrid stream.
///
/// Decoding stops at the end of the underlying buffer; a run header promising more
/// values than the buffer holds yields only the values actually present.
pub struct RleDecoder {
    bit_width: usize,
    reader: BitReader,
    rle_left: usize,
    bit_packed_left: usize,
    current_value: u64,
}

impl RleDecoder {
    /// Creates a decoder over `data` for values of `bit_width` bits.
    ///
    /// # Errors
    ///
    /// Returns `CorruptPage` if `bit_width` exceeds 64.
    pub fn new(bit_width: u8, data: Bytes) -> Result<RleDecoder> {
        if bit_width > 64 {
            return Err(Error::corrupt_page(format!(
                "invalid hybrid stream bit width {bit_width}"
            )));
        }
        Ok(RleDecoder {
            bit_width: bit_width as usize,
            reader: BitReader::new(data),
            rle_left: 0,
            bit_packed_left: 0,
            current_value: 0,
        })
    }

    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    /// Decodes up to `out.len()` values.
    ///
    /// # Returns
    ///
    /// The number of values written to the front of `out`, which is smaller than
    /// `out.len()` only when the stream is exhausted.
    pub fn get_batch<T: RleValue>(&mut self, out: &mut [T]) -> usize {
        let mut count = 0;
        while count < out.len() {
            if self.rle_left > 0 {
                let n = self.rle_left.min(out.len() - count);
                out[count..count + n].fill(T::from_u64(self.current_value));
                self.rle_left -= n;
                count += n;
            } else if self.bit_packed_left > 0 {
                let n = self.bit_packed_left.min(out.len() - count);
                for slot in &mut out[count..count + n] {
                    match self.reader.get_value(self.bit_width) {
                        Some(value) => {
                            *slot = T::from_u64(value);
                            count += 1;
                            self.bit_packed_left -= 1;
                        }
                        None => {
                            self.bit_packed_left = 0;
                            return count;
                        }
                    }
                }
            } else if !self.reload() {
                break;
            }
        }
        count
    }

    /// Decodes a single value, `None` at the end of the stream.
    pub fn get<T: RleValue>(&mut self) -> Option<T> {
        let mut value = [T::default()];
        (self.get_batch(&mut value) == 1).then_some(value[0])
    }

    /// Skips up to `count` values, returning the number actually skipped.
    pub fn skip(&mut self, count: usize) -> usize {
        let mut skipped = 0;
        let mut scratch = [0u64; 64];
        while skipped < count {
            let n = (count - skipped).min(scratch.len());
            let decoded = self.get_batch(&mut scratch[..n]);
            skipped += decoded;
            if decoded < n {
                break;
            }
        }
        skipped
    }

    fn reload(&mut self) -> bool {
        let Some(header) = self.reader.get_vlq_int() else {
            return false;
        };
        let count = (header >> 1) as usize;
        if header & 1 == 1 {
            self.bit_packed_left = count.saturating_mul(8);
        } else {
            let Some(value) = self.reader.get_aligned(bytes_for_bits(self.bit_width)) else {
                return false;
            };
            self.current_value = value;
            self.rle_left = count;
        }
        true
    }
}

/// Encoder of hybrid streams.
///
/// Runs of at least eight equal values become repeated runs; everything else is
/// bit-packed in groups of eight, the last group zero-padded.
pub struct RleEncoder {
    bit_width: usize,
    writer: BitWriter,
    literals: Vec<u64>,
    run_value: u64,
    run_length: usize,
}

impl RleEncoder {
    const MIN_REPEATED_RUN: usize = 8;

    pub fn new(bit_width: u8) -> RleEncoder {
        RleEncoder {
            bit_width: bit_width as usize,
            writer: BitWriter::new(),
            literals: Vec::new(),
            run_value: 0,
            run_length: 0,
        }
    }

    /// Encodes `values` in one go.
    pub fn encode(bit_width: u8, values: impl IntoIterator<Item = u64>) -> Vec<u8> {
        let mut encoder = RleEncoder::new(bit_width);
        for value in values {
            encoder.put(value);
        }
        encoder.finish()
    }

    pub fn put(&mut self, value: u64) {
        if self.run_length > 0 && value == self.run_value {
            self.run_length += 1;
            return;
        }
        self.end_run();
        self.run_value = value;
        self.run_length = 1;
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.end_run();
        self.flush_literals();
        self.writer.into_inner()
    }

    fn end_run(&mut self) {
        // Literal groups must stay multiples of eight, so top up pending literals first.
        while self.run_length > 0 && self.literals.len() % 8 != 0 {
            self.literals.push(self.run_value);
            self.run_length -= 1;
        }
        if self.run_length >= Self::MIN_REPEATED_RUN {
            self.flush_literals();
            self.writer.put_vlq_int((self.run_length as u64) << 1);
            self.writer
                .put_aligned(self.run_value, bytes_for_bits(self.bit_width));
        } else {
            self.literals
                .extend(std::iter::repeat_n(self.run_value, self.run_length));
        }
        self.run_length = 0;
    }

    fn flush_literals(&mut self) {
        if self.literals.is_empty() {
            return;
        }
        let groups = self.literals.len().div_ceil(8);
        self.literals.resize(groups * 8, 0);
        self.writer.put_vlq_int(((groups as u64) << 1) | 1);
        for &value in &self.literals {
            self.writer.put_value(value, self.bit_width);
        }
        self.writer.align();
        self.literals.clear();
    }
}
