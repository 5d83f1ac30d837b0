//! Definition and repetition level decoding.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use parcel_common::{Result, error::Error};
use parcel_format::Encoding;

use crate::{
    bit_util::{BitReader, bit_width, bytes_for_bits},
    rle::RleDecoder,
};

enum LevelStream {
    /// `max_level == 0`: no stream on disk, every level is zero.
    Constant,
    Rle(RleDecoder),
    BitPacked(BitReader),
}

/// Decodes a stream of definition or repetition levels.
///
/// The decoder is resumable: successive [`decode`](LevelDecoder::decode) calls continue
/// where the previous one stopped.
pub struct LevelDecoder {
    max_level: i16,
    bit_width: u8,
    stream: LevelStream,
}

impl LevelDecoder {
    /// Creates a decoder for the levels section of a data page v1.
    ///
    /// # Arguments
    ///
    /// * `encoding` - Level encoding from the page header (`RLE` or `BIT_PACKED`).
    /// * `max_level` - Maximum level of the column; zero means no stream is present.
    /// * `num_values` - Number of level slots in the page.
    /// * `data` - Page bytes starting at the levels section.
    ///
    /// # Returns
    ///
    /// The decoder and the number of bytes its section occupies in `data`: the 4-byte
    /// length prefix plus the declared length for `RLE`, the bit-packed size for
    /// `BIT_PACKED`. The declared length is trusted even if `data` is shorter, in which
    /// case decoding past the available bytes fails with `ShortRead`.
    pub fn new_v1(
        encoding: Encoding,
        max_level: i16,
        num_values: usize,
        data: &Bytes,
    ) -> Result<(LevelDecoder, usize)> {
        let bit_width = level_bit_width(max_level)?;
        if max_level == 0 {
            return Ok((Self::constant(), 0));
        }
        match encoding {
            Encoding::Rle => {
                if data.len() < 4 {
                    return Err(Error::short_read("level length prefix", 4, data.len()));
                }
                let len = LittleEndian::read_u32(&data[..4]) as usize;
                let consumed = len.saturating_add(4);
                let section = data.slice(4..consumed.min(data.len()));
                let decoder = RleDecoder::new(bit_width, section)?;
                Ok((
                    LevelDecoder {
                        max_level,
                        bit_width,
                        stream: LevelStream::Rle(decoder),
                    },
                    consumed,
                ))
            }
            Encoding::BitPacked => {
                let consumed = bytes_for_bits(num_values.saturating_mul(bit_width as usize));
                let section = data.slice(..consumed.min(data.len()));
                Ok((
                    LevelDecoder {
                        max_level,
                        bit_width,
                        stream: LevelStream::BitPacked(BitReader::new(section)),
                    },
                    consumed,
                ))
            }
            other => Err(Error::encoding(format!("unsupported level encoding {other}"))),
        }
    }

    /// Creates a decoder for a levels section of a data page v2, whose byte length
    /// comes from the page header and carries no prefix.
    pub fn new_v2(max_level: i16, data: Bytes) -> Result<LevelDecoder> {
        let bit_width = level_bit_width(max_level)?;
        if max_level == 0 {
            return Ok(Self::constant());
        }
        Ok(LevelDecoder {
            max_level,
            bit_width,
            stream: LevelStream::Rle(RleDecoder::new(bit_width, data)?),
        })
    }

    fn constant() -> LevelDecoder {
        LevelDecoder {
            max_level: 0,
            bit_width: 0,
            stream: LevelStream::Constant,
        }
    }

    pub fn max_level(&self) -> i16 {
        self.max_level
    }

    pub fn bit_width(&self) -> u8 {
        self.bit_width
    }

    /// Fills `out` with the next `out.len()` levels.
    ///
    /// # Errors
    ///
    /// * `ShortRead` if the stream ends before `out` is full; the levels decoded so
    ///   far remain in `out`.
    /// * `CorruptPage` if a decoded level exceeds the maximum level.
    pub fn decode(&mut self, out: &mut [i16]) -> Result<usize> {
        let decoded = match &mut self.stream {
            LevelStream::Constant => {
                out.fill(0);
                out.len()
            }
            LevelStream::Rle(decoder) => decoder.get_batch(out),
            LevelStream::BitPacked(reader) => {
                let mut count = 0;
                for slot in out.iter_mut() {
                    match reader.get_value(self.bit_width as usize) {
                        Some(level) => *slot = level as i16,
                        None => break,
                    }
                    count += 1;
                }
                count
            }
        };

        if let Some(bad) = out[..decoded]
            .iter()
            .find(|&&level| level < 0 || level > self.max_level)
        {
            return Err(Error::corrupt_page(format!(
                "level {bad} exceeds maximum level {}",
                self.max_level
            )));
        }
        if decoded < out.len() {
            return Err(Error::short_read(
                "level stream",
                out.len(),
                decoded,
            ));
        }
        Ok(decoded)
    }
}

fn level_bit_width(max_level: i16) -> Result<u8> {
    if max_level < 0 {
        return Err(Error::invalid_arg(
            "max_level",
            format!("negative maximum level {max_level}"),
        ));
    }
    Ok(bit_width(max_level as u64))
}
