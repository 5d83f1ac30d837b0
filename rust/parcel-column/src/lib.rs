//! Column decoding engine.
//!
//! Turns the byte range of a column chunk into typed value batches plus their
//! definition and repetition levels:
//!
//! - [`page_reader::PageReader`] walks the pages of one chunk and decompresses them;
//! - [`column_reader::TypedColumnReader`] decodes levels and values across pages,
//!   resolving dictionary-encoded pages;
//! - [`scanner::Scanner`] offers a value-at-a-time cursor on top of it;
//! - [`file_reader::FileReader`] and [`file_reader::RowGroupReader`] bind parsed
//!   footer metadata to per-column readers.

pub mod column_reader;
pub mod compression;
pub mod file_reader;
pub mod page;
pub mod page_reader;
pub mod properties;
pub mod scanner;

mod value_decoder;

#[cfg(test)]
mod tests;

pub use column_reader::{ColumnReader, ColumnValueType, TypedColumnReader};
pub use file_reader::{FileReader, RowGroupReader};
pub use page::Page;
pub use page_reader::PageReader;
pub use properties::ReaderProperties;
pub use scanner::{ScannedValue, Scanner};
