use bytes::Bytes;
use parcel_format::{
    Encoding, PageType,
    page_header::{PageBody, PageHeader},
};

/// A decompressed page of a column chunk.
///
/// For data pages v2 the buffer holds the (never compressed) level sections followed
/// by the decompressed values section, so all data page layouts can be addressed the
/// same way.
#[derive(Debug, Clone)]
pub struct Page {
    header: PageHeader,
    buffer: Bytes,
    offset: u64,
    truncated: bool,
}

impl Page {
    pub fn new(header: PageHeader, buffer: Bytes, offset: u64, truncated: bool) -> Page {
        Page {
            header,
            buffer,
            offset,
            truncated,
        }
    }

    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    pub fn body(&self) -> &PageBody {
        &self.header.body
    }

    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    /// Number of level slots in the page.
    pub fn num_values(&self) -> usize {
        self.header.num_values() as usize
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.header.encoding()
    }

    /// Decompressed page contents.
    pub fn buffer(&self) -> &Bytes {
        &self.buffer
    }

    /// Offset of the page header relative to the start of the column chunk.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns `true` if fewer payload bytes than declared by the header were available.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}
