//! Enumerations stored as `i32` tags in the file footer and in page headers.

use std::fmt;

use parcel_common::error::Error;

macro_rules! tagged_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal => $display:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl $name {
            /// Returns the on-disk tag of this value.
            pub fn as_i32(self) -> i32 {
                self as i32
            }

            /// Returns the canonical upper-case name of this value.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $display,)+
                }
            }
        }

        impl TryFrom<i32> for $name {
            type Error = Error;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err(Error::invalid_format(
                        stringify!($name),
                        format!("unknown tag {value}"),
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

tagged_enum! {
    /// Physical (storage) type of a leaf column.
    PhysicalType {
        Boolean = 0 => "BOOLEAN",
        Int32 = 1 => "INT32",
        Int64 = 2 => "INT64",
        /// Deprecated 12-byte timestamp representation.
        Int96 = 3 => "INT96",
        Float = 4 => "FLOAT",
        Double = 5 => "DOUBLE",
        ByteArray = 6 => "BYTE_ARRAY",
        FixedLenByteArray = 7 => "FIXED_LEN_BYTE_ARRAY",
    }
}

tagged_enum! {
    /// Encoding of values or levels within a page.
    Encoding {
        Plain = 0 => "PLAIN",
        /// Dictionary indices in a data page v1 (dictionary page itself is `Plain`).
        PlainDictionary = 2 => "PLAIN_DICTIONARY",
        Rle = 3 => "RLE",
        /// Deprecated level encoding: plain bit-packing without run headers.
        BitPacked = 4 => "BIT_PACKED",
        DeltaBinaryPacked = 5 => "DELTA_BINARY_PACKED",
        DeltaLengthByteArray = 6 => "DELTA_LENGTH_BYTE_ARRAY",
        DeltaByteArray = 7 => "DELTA_BYTE_ARRAY",
        RleDictionary = 8 => "RLE_DICTIONARY",
        ByteStreamSplit = 9 => "BYTE_STREAM_SPLIT",
    }
}

tagged_enum! {
    /// Compression codec applied to the pages of a column chunk.
    CompressionCodec {
        Uncompressed = 0 => "UNCOMPRESSED",
        Snappy = 1 => "SNAPPY",
        Gzip = 2 => "GZIP",
        Lzo = 3 => "LZO",
        Brotli = 4 => "BROTLI",
        /// LZ4 as written by Hadoop-based producers (length-prefixed blocks).
        Lz4 = 5 => "LZ4",
        Zstd = 6 => "ZSTD",
        Lz4Raw = 7 => "LZ4_RAW",
    }
}

tagged_enum! {
    /// Kind of a page within a column chunk.
    PageType {
        DataPage = 0 => "DATA_PAGE",
        IndexPage = 1 => "INDEX_PAGE",
        DictionaryPage = 2 => "DICTIONARY_PAGE",
        DataPageV2 = 3 => "DATA_PAGE_V2",
    }
}

impl Encoding {
    /// Returns `true` for the encodings whose values are dictionary indices.
    pub fn is_dictionary(self) -> bool {
        matches!(self, Encoding::PlainDictionary | Encoding::RleDictionary)
    }
}

impl PhysicalType {
    /// Returns the fixed on-disk width of a plain-encoded value in bytes, or `None`
    /// for variable or descriptor-dependent widths.
    ///
    /// Booleans are bit-packed in plain encoding and report `None` as well.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            PhysicalType::Int32 | PhysicalType::Float => Some(4),
            PhysicalType::Int64 | PhysicalType::Double => Some(8),
            PhysicalType::Int96 => Some(12),
            PhysicalType::Boolean | PhysicalType::ByteArray | PhysicalType::FixedLenByteArray => {
                None
            }
        }
    }
}
