//! Page compression, the inverse of the reader's codec registry.

use std::io::Write;

use parcel_format::CompressionCodec;

/// Compresses `data` the way a writer using `codec` lays out a page payload.
///
/// `LZ4` uses the Hadoop framing (big-endian decompressed and compressed sizes ahead
/// of a single raw block); `LZ4_RAW` is the bare block.
pub fn compress(codec: CompressionCodec, data: &[u8]) -> Vec<u8> {
    match codec {
        CompressionCodec::Uncompressed => data.to_vec(),
        CompressionCodec::Snappy => snap::raw::Encoder::new()
            .compress_vec(data)
            .expect("snappy compress"),
        CompressionCodec::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data).expect("gzip write");
            encoder.finish().expect("gzip finish")
        }
        CompressionCodec::Zstd => zstd::encode_all(data, 3).expect("zstd compress"),
        CompressionCodec::Lz4Raw => lz4_block(data),
        CompressionCodec::Lz4 => {
            let block = lz4_block(data);
            let mut out = Vec::with_capacity(block.len() + 8);
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            out.extend_from_slice(&(block.len() as u32).to_be_bytes());
            out.extend(block);
            out
        }
        other => panic!("no compressor for {other}"),
    }
}

fn lz4_block(data: &[u8]) -> Vec<u8> {
    lz4::block::compress(data, None, false).expect("lz4 compress")
}
