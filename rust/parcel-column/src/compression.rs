//! Page decompression.
//!
//! Codecs are looked up by [`CompressionCodec`] in a [`CodecRegistry`]. The default
//! registry covers Snappy, Gzip, Zstd, LZ4 (raw and Hadoop-framed); additional
//! implementations can be registered by callers.

use std::{io::Read, sync::Arc};

use ahash::AHashMap;
use parcel_common::{Result, error::Error};
use parcel_format::CompressionCodec;

/// A block decompressor for one codec.
pub trait Decompressor: Send + Sync + 'static {
    /// The codec this decompressor handles.
    fn codec(&self) -> CompressionCodec;

    /// Decompresses `input`, appending the result to `output`.
    ///
    /// # Arguments
    ///
    /// * `input` - Compressed bytes. May be shorter than what the writer produced if
    ///   the page is truncated.
    /// * `output` - Destination buffer. On failure it holds whatever the codec produced
    ///   before the error.
    /// * `uncompressed_size` - Size declared by the page header; decompression stops
    ///   once this many bytes were produced.
    fn decompress(&self, input: &[u8], output: &mut Vec<u8>, uncompressed_size: usize)
    -> Result<()>;
}

/// Registry of the decompressors available to page readers.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: AHashMap<CompressionCodec, Arc<dyn Decompressor>>,
}

impl CodecRegistry {
    /// Creates a registry without any codecs; only uncompressed chunks can be read.
    pub fn empty() -> CodecRegistry {
        CodecRegistry {
            codecs: AHashMap::new(),
        }
    }

    /// Registers (or replaces) the decompressor for its codec.
    pub fn register(&mut self, decompressor: Arc<dyn Decompressor>) {
        self.codecs.insert(decompressor.codec(), decompressor);
    }

    pub fn with(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.register(decompressor);
        self
    }

    /// Resolves the decompressor for `codec`; `None` for uncompressed chunks.
    ///
    /// # Errors
    ///
    /// Returns a `Codec` error if no decompressor is registered for `codec`.
    pub fn get(&self, codec: CompressionCodec) -> Result<Option<Arc<dyn Decompressor>>> {
        if codec == CompressionCodec::Uncompressed {
            return Ok(None);
        }
        self.codecs
            .get(&codec)
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::codec(codec.name(), "codec is not supported"))
    }

    pub fn supports(&self, codec: CompressionCodec) -> bool {
        codec == CompressionCodec::Uncompressed || self.codecs.contains_key(&codec)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        CodecRegistry::empty()
            .with(Arc::new(SnappyDecompressor))
            .with(Arc::new(GzipDecompressor))
            .with(Arc::new(ZstdDecompressor))
            .with(Arc::new(Lz4RawDecompressor))
            .with(Arc::new(Lz4HadoopDecompressor))
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut codecs = self.codecs.keys().map(|c| c.name()).collect::<Vec<_>>();
        codecs.sort_unstable();
        f.debug_struct("CodecRegistry")
            .field("codecs", &codecs)
            .finish()
    }
}

/// A Snappy copy element of 3 bytes emits at most 64 bytes.
const SNAPPY_MAX_EXPANSION: usize = 32;

/// An LZ4 sequence emits at most 255 bytes per input byte.
const LZ4_MAX_EXPANSION: usize = 255;

pub struct SnappyDecompressor;

impl Decompressor for SnappyDecompressor {
    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Snappy
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompressed_size: usize,
    ) -> Result<()> {
        let len = snap::raw::decompress_len(input).map_err(|e| Error::codec_failure("SNAPPY", e))?;
        if len > uncompressed_size {
            return Err(Error::codec(
                "SNAPPY",
                format!("block of {len} bytes exceeds declared page size {uncompressed_size}"),
            ));
        }
        let start = output.len();
        // A longer claim cannot be backed by `input`; the decoder then fails on the
        // short buffer instead of after a huge allocation.
        output.resize(start + len.min(max_expansion(input, SNAPPY_MAX_EXPANSION)), 0);
        match snap::raw::Decoder::new().decompress(input, &mut output[start..]) {
            Ok(written) => {
                output.truncate(start + written);
                Ok(())
            }
            Err(e) => {
                output.truncate(start);
                Err(Error::codec_failure("SNAPPY", e))
            }
        }
    }
}

pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Gzip
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompressed_size: usize,
    ) -> Result<()> {
        let decoder = flate2::read::GzDecoder::new(input);
        read_stream(decoder, output, uncompressed_size).map_err(|e| Error::codec_failure("GZIP", e))
    }
}

pub struct ZstdDecompressor;

impl Decompressor for ZstdDecompressor {
    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Zstd
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompressed_size: usize,
    ) -> Result<()> {
        let decoder = zstd::stream::read::Decoder::new(input)
            .map_err(|e| Error::io("Failed to create ZSTD decoder", e))?;
        read_stream(decoder, output, uncompressed_size).map_err(|e| Error::codec_failure("ZSTD", e))
    }
}

pub struct Lz4RawDecompressor;

impl Decompressor for Lz4RawDecompressor {
    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Lz4Raw
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompressed_size: usize,
    ) -> Result<()> {
        lz4_block_decompress(input, output, uncompressed_size)
            .map_err(|e| Error::codec_failure("LZ4_RAW", e))
    }
}

/// LZ4 as written by Hadoop-based producers: a sequence of frames, each prefixed with
/// big-endian decompressed and compressed sizes. Input that does not parse as such
/// frames is retried as a raw LZ4 block.
pub struct Lz4HadoopDecompressor;

impl Lz4HadoopDecompressor {
    const PREFIX_LEN: usize = 8;

    fn try_decompress_hadoop(input: &[u8], output: &mut Vec<u8>, limit: usize) -> Result<()> {
        let start = output.len();
        let mut input = input;
        while !input.is_empty() {
            if input.len() < Self::PREFIX_LEN {
                return Err(Error::codec("LZ4", "incomplete Hadoop frame header"));
            }
            let frame_decompressed = u32::from_be_bytes([input[0], input[1], input[2], input[3]]);
            let frame_compressed = u32::from_be_bytes([input[4], input[5], input[6], input[7]]);
            input = &input[Self::PREFIX_LEN..];
            let (frame_decompressed, frame_compressed) =
                (frame_decompressed as usize, frame_compressed as usize);
            if input.len() < frame_compressed {
                return Err(Error::codec("LZ4", "not enough bytes for Hadoop frame"));
            }
            if output.len() - start + frame_decompressed > limit {
                return Err(Error::codec("LZ4", "Hadoop frame exceeds declared page size"));
            }
            let before = output.len();
            lz4_block_decompress(&input[..frame_compressed], output, frame_decompressed)
                .map_err(|e| Error::codec_failure("LZ4", e))?;
            if output.len() - before != frame_decompressed {
                return Err(Error::codec("LZ4", "unexpected Hadoop frame size"));
            }
            input = &input[frame_compressed..];
        }
        Ok(())
    }
}

impl Decompressor for Lz4HadoopDecompressor {
    fn codec(&self) -> CompressionCodec {
        CompressionCodec::Lz4
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompressed_size: usize,
    ) -> Result<()> {
        let start = output.len();
        if Self::try_decompress_hadoop(input, output, uncompressed_size).is_ok() {
            return Ok(());
        }
        output.truncate(start);
        lz4_block_decompress(input, output, uncompressed_size)
            .map_err(|e| Error::codec_failure("LZ4", e))
    }
}

fn lz4_block_decompress(
    input: &[u8],
    output: &mut Vec<u8>,
    uncompressed_size: usize,
) -> std::io::Result<()> {
    let start = output.len();
    let capacity = uncompressed_size.min(max_expansion(input, LZ4_MAX_EXPANSION));
    let size = i32::try_from(capacity)
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;
    output.resize(start + capacity, 0);
    match lz4::block::decompress_to_buffer(input, Some(size), &mut output[start..]) {
        Ok(written) => {
            output.truncate(start + written);
            Ok(())
        }
        Err(e) => {
            output.truncate(start);
            Err(e)
        }
    }
}

/// Drains a streaming decoder into `output`, up to `limit` bytes. Bytes produced
/// before an error are kept in `output`.
fn read_stream<R: Read>(read: R, output: &mut Vec<u8>, limit: usize) -> std::io::Result<()> {
    read.take(limit as u64).read_to_end(output).map(|_| ())
}

/// Upper bound on what a block codec can expand `input` to.
fn max_expansion(input: &[u8], ratio: usize) -> usize {
    input.len().saturating_mul(ratio).saturating_add(64)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn sample_data() -> Vec<u8> {
        (0..10_000u32)
            .flat_map(|i| (i % 97).to_le_bytes())
            .collect()
    }

    fn check_round_trip(codec: CompressionCodec, compressed: &[u8], expected: &[u8]) {
        let registry = CodecRegistry::default();
        let decompressor = registry.get(codec).unwrap().unwrap();
        let mut output = Vec::new();
        decompressor
            .decompress(compressed, &mut output, expected.len())
            .unwrap();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_snappy() {
        let data = sample_data();
        let compressed = snap::raw::Encoder::new().compress_vec(&data).unwrap();
        check_round_trip(CompressionCodec::Snappy, &compressed, &data);
    }

    #[test]
    fn test_gzip() {
        let data = sample_data();
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&data).unwrap();
        let compressed = encoder.finish().unwrap();
        check_round_trip(CompressionCodec::Gzip, &compressed, &data);
    }

    #[test]
    fn test_zstd() {
        let data = sample_data();
        let compressed = zstd::stream::encode_all(&data[..], 3).unwrap();
        check_round_trip(CompressionCodec::Zstd, &compressed, &data);
    }

    #[test]
    fn test_lz4_raw_and_hadoop() {
        let data = sample_data();
        let block = lz4::block::compress(&data, None, false).unwrap();
        check_round_trip(CompressionCodec::Lz4Raw, &block, &data);
        // raw blocks are accepted for LZ4 as well
        check_round_trip(CompressionCodec::Lz4, &block, &data);

        let (first, second) = data.split_at(12_345);
        let mut framed = Vec::new();
        for part in [first, second] {
            let block = lz4::block::compress(part, None, false).unwrap();
            framed.extend_from_slice(&(part.len() as u32).to_be_bytes());
            framed.extend_from_slice(&(block.len() as u32).to_be_bytes());
            framed.extend_from_slice(&block);
        }
        check_round_trip(CompressionCodec::Lz4, &framed, &data);
    }

    #[test]
    fn test_truncated_stream_keeps_prefix() {
        let data = sample_data();
        let compressed = zstd::stream::encode_all(&data[..], 1).unwrap();
        let truncated = &compressed[..compressed.len() / 2];
        let mut output = Vec::new();
        let result = ZstdDecompressor.decompress(truncated, &mut output, data.len());
        assert!(result.is_err());
        assert!(output.len() < data.len());
        assert_eq!(&output[..], &data[..output.len()]);
    }

    #[test]
    fn test_declared_size_is_only_a_limit() {
        let data = sample_data();
        let huge = i32::MAX as usize;
        let cases = [
            (
                CompressionCodec::Snappy,
                snap::raw::Encoder::new().compress_vec(&data).unwrap(),
            ),
            (
                CompressionCodec::Zstd,
                zstd::stream::encode_all(&data[..], 3).unwrap(),
            ),
            (
                CompressionCodec::Lz4Raw,
                lz4::block::compress(&data, None, false).unwrap(),
            ),
        ];
        let registry = CodecRegistry::default();
        for (codec, compressed) in cases {
            let mut output = Vec::new();
            registry
                .get(codec)
                .unwrap()
                .unwrap()
                .decompress(&compressed, &mut output, huge)
                .unwrap();
            assert_eq!(output, data, "{codec}");
            assert!(output.capacity() < 64 << 20, "{codec}");
        }
    }

    #[test]
    fn test_snappy_length_claim_beyond_input() {
        // Varint length prefix of i32::MAX followed by a single literal tag.
        let block = [0xff, 0xff, 0xff, 0xff, 0x07, 0x00];
        let mut output = Vec::new();
        let result = SnappyDecompressor.decompress(&block, &mut output, i32::MAX as usize);
        assert!(result.is_err());
        assert!(output.is_empty());
    }

    #[test]
    fn test_unsupported_codec() {
        let registry = CodecRegistry::default();
        assert!(registry.get(CompressionCodec::Uncompressed).unwrap().is_none());
        let err = registry.get(CompressionCodec::Brotli).err().unwrap();
        assert!(err.to_string().contains("BROTLI"));
        assert!(!registry.supports(CompressionCodec::Lzo));
        assert!(!CodecRegistry::empty().supports(CompressionCodec::Snappy));
    }
}
