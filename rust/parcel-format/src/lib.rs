//! Definitions of the columnar file format elements consumed by the decoding engine:
//! physical types and encodings, column descriptors, parsed footer metadata and
//! page headers, along with the Thrift compact-protocol reader used to parse the latter.

pub mod descriptor;
pub mod metadata;
pub mod page_header;
pub mod statistics;
pub mod thrift;
pub mod types;
pub mod version;

pub use descriptor::{ColumnDescriptor, ColumnPath};
pub use types::{CompressionCodec, Encoding, PageType, PhysicalType};
