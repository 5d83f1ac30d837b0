use std::sync::Arc;

use crate::compression::{CodecRegistry, Decompressor};

/// Options controlling how column chunks are read.
///
/// ```ignore
/// let properties = ReaderProperties::default()
///     .with_scanner_batch_size(1024)
///     .with_max_page_header_size(1 << 20);
/// ```
#[derive(Debug, Clone)]
pub struct ReaderProperties {
    scanner_batch_size: usize,
    initial_header_window: usize,
    max_page_header_size: usize,
    codecs: Arc<CodecRegistry>,
}

impl ReaderProperties {
    pub const DEFAULT_SCANNER_BATCH_SIZE: usize = 128;
    pub const DEFAULT_INITIAL_HEADER_WINDOW: usize = 16 * 1024;
    pub const DEFAULT_MAX_PAGE_HEADER_SIZE: usize = 16 * 1024 * 1024;

    pub fn new() -> ReaderProperties {
        ReaderProperties::default()
    }

    /// Number of level slots a [`Scanner`](crate::Scanner) buffers per refill.
    pub fn scanner_batch_size(&self) -> usize {
        self.scanner_batch_size
    }

    /// Number of bytes initially fetched when parsing a page header.
    pub fn initial_header_window(&self) -> usize {
        self.initial_header_window
    }

    /// Upper bound on the size of a single page header.
    pub fn max_page_header_size(&self) -> usize {
        self.max_page_header_size
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn with_scanner_batch_size(mut self, batch_size: usize) -> Self {
        self.scanner_batch_size = batch_size;
        self
    }

    pub fn with_initial_header_window(mut self, size: usize) -> Self {
        self.initial_header_window = size.max(1);
        self
    }

    pub fn with_max_page_header_size(mut self, size: usize) -> Self {
        self.max_page_header_size = size.max(1);
        self
    }

    pub fn with_codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = Arc::new(codecs);
        self
    }

    /// Registers an additional decompressor on top of the current codec registry.
    pub fn with_decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        Arc::make_mut(&mut self.codecs).register(decompressor);
        self
    }
}

impl Default for ReaderProperties {
    fn default() -> Self {
        ReaderProperties {
            scanner_batch_size: Self::DEFAULT_SCANNER_BATCH_SIZE,
            initial_header_window: Self::DEFAULT_INITIAL_HEADER_WINDOW,
            max_page_header_size: Self::DEFAULT_MAX_PAGE_HEADER_SIZE,
            codecs: Arc::new(CodecRegistry::default()),
        }
    }
}
