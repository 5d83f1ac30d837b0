//! Value and level encodings of the columnar format, decode side.
//!
//! - [`bit_util`]: LSB-first bit reader and writer.
//! - [`rle`]: the hybrid run-length / bit-packed stream used for levels, dictionary
//!   indices and booleans.
//! - [`levels`]: definition/repetition level decoding on top of [`rle`].
//! - [`plain`]: plain decoding for every physical type.
//! - [`dictionary`]: dictionary materialization and index resolution.
//! - [`data_type`]: the physical type family the typed readers are generic over.

pub mod bit_util;
pub mod data_type;
pub mod dictionary;
pub mod levels;
pub mod plain;
pub mod rle;
