//! Sequential reader of the pages of one column chunk.

use std::{ops::Range, sync::Arc};

use bytes::Bytes;
use log::{debug, trace, warn};
use parcel_common::{Result, error::Error, try_or_ret_some_err};
use parcel_format::{
    CompressionCodec, PageType,
    page_header::{PageBody, PageHeader},
};
use parcel_io::{ReadAt, SlicedFile};

use crate::{compression::Decompressor, page::Page, properties::ReaderProperties};

/// Iterates the pages of a column chunk in on-disk order, decompressing each.
///
/// The cursor always advances by the compressed size declared in a page header, even
/// when fewer bytes are actually present. Such pages are yielded with whatever data
/// could be recovered, and an error surfaces only once a decoder reads past it.
pub struct PageReader {
    chunk: SlicedFile<Arc<dyn ReadAt>>,
    codec: CompressionCodec,
    decompressor: Option<Arc<dyn Decompressor>>,
    initial_header_window: usize,
    max_page_header_size: usize,
    pos: u64,
    finished: bool,
    pages_read: usize,
    total_values: Option<u64>,
    values_seen: u64,
}

impl PageReader {
    /// Creates a page reader over `range` of `source`.
    ///
    /// # Arguments
    ///
    /// * `source` - The byte source holding the column chunk.
    /// * `range` - Byte range of the chunk within `source`. It may extend past the end
    ///   of the source, in which case reads near the end come back short.
    /// * `codec` - Compression codec of the chunk's pages.
    /// * `properties` - Reader options (header window sizes and codec registry).
    ///
    /// # Errors
    ///
    /// Returns a `Codec` error if `codec` has no registered decompressor.
    pub fn new(
        source: Arc<dyn ReadAt>,
        range: Range<u64>,
        codec: CompressionCodec,
        properties: &ReaderProperties,
    ) -> Result<PageReader> {
        let decompressor = properties.codecs().get(codec)?;
        let chunk = SlicedFile::new(source, range.clone())
            .map_err(|e| Error::io("column chunk range", e))?;
        debug!(
            "page reader over {}..{} ({} bytes, {codec})",
            range.start,
            range.end,
            chunk.slice_size()
        );
        Ok(PageReader {
            chunk,
            codec,
            decompressor,
            initial_header_window: properties.initial_header_window(),
            max_page_header_size: properties.max_page_header_size(),
            pos: 0,
            finished: false,
            pages_read: 0,
            total_values: None,
            values_seen: 0,
        })
    }

    /// Stops the page stream once data pages holding `total_values` level slots have
    /// been returned, even if the chunk range extends further.
    pub fn with_total_values(mut self, total_values: i64) -> Self {
        self.total_values = Some(total_values.max(0) as u64);
        self
    }

    pub fn codec(&self) -> CompressionCodec {
        self.codec
    }

    /// Current offset within the chunk: the start of the next page header.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Number of pages yielded so far, index pages excluded.
    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    /// Returns the next page, or `None` at the end of the chunk.
    ///
    /// # Errors
    ///
    /// * `CorruptPage` if a header cannot be parsed within the maximum header size.
    /// * `Codec` if a complete payload fails to decompress.
    /// * `Io` if the byte source fails.
    pub fn next_page(&mut self) -> Result<Option<Page>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            let all_values_seen = self
                .total_values
                .is_some_and(|total| self.values_seen >= total);
            if all_values_seen || self.pos >= self.chunk.slice_size() {
                self.finished = true;
                return Ok(None);
            }
            let Some((header, header_len)) = self.read_header()? else {
                self.finished = true;
                return Ok(None);
            };

            let page_offset = self.pos;
            let payload_start = page_offset + header_len as u64;
            let compressed_size = header.compressed_page_size as u64;
            self.pos = payload_start + compressed_size;

            if header.page_type == PageType::IndexPage {
                trace!("skipping index page at {page_offset}");
                continue;
            }

            let payload = self.read(payload_start..payload_start + compressed_size)?;
            let truncated = (payload.len() as u64) < compressed_size;
            if truncated {
                debug!(
                    "{} at {page_offset} declares {compressed_size} bytes, {} available",
                    header.page_type,
                    payload.len()
                );
            }
            let buffer = self.decode_payload(&header, payload, truncated)?;
            trace!(
                "{} at {page_offset}: {} values, {} bytes",
                header.page_type,
                header.num_values(),
                buffer.len()
            );
            self.pages_read += 1;
            if matches!(header.body, PageBody::Data(_) | PageBody::DataV2(_)) {
                self.values_seen += header.num_values() as u64;
            }
            return Ok(Some(Page::new(header, buffer, page_offset, truncated)));
        }
    }

    /// Parses the page header at the cursor, growing the probe window until the header
    /// fits. Returns `None` if no bytes remain.
    fn read_header(&self) -> Result<Option<(PageHeader, usize)>> {
        let chunk_len = self.chunk.slice_size();
        let storage_profile = self.chunk.storage_profile();
        let mut window = storage_profile
            .clamp_io_size(self.initial_header_window)
            .min(self.max_page_header_size) as u64;
        loop {
            let end = self.pos.saturating_add(window).min(chunk_len);
            let bytes = self.read(self.pos..end)?;
            if bytes.is_empty() {
                return Ok(None);
            }
            match PageHeader::read_from(&bytes) {
                Ok(parsed) => return Ok(Some(parsed)),
                Err(e) if e.is_short_read() => {
                    let source_exhausted = (bytes.len() as u64) < end - self.pos;
                    if source_exhausted || end == chunk_len {
                        return Err(Error::corrupt_page(format!(
                            "page header at {} is cut off after {} bytes",
                            self.pos,
                            bytes.len()
                        )));
                    }
                    if window >= self.max_page_header_size as u64 {
                        return Err(Error::corrupt_page(format!(
                            "page header at {} exceeds the maximum header size of {} bytes",
                            self.pos, self.max_page_header_size
                        )));
                    }
                    window = (window * 2).min(self.max_page_header_size as u64);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn decode_payload(&self, header: &PageHeader, payload: Bytes, truncated: bool) -> Result<Bytes> {
        let Some(decompressor) = &self.decompressor else {
            return Ok(payload);
        };
        let uncompressed_size = header.uncompressed_page_size as usize;
        match &header.body {
            PageBody::DataV2(v2) => {
                if !v2.is_compressed {
                    return Ok(payload);
                }
                let levels_len = (v2.definition_levels_byte_length as usize)
                    .saturating_add(v2.repetition_levels_byte_length as usize);
                let levels_end = levels_len.min(payload.len());
                let mut buffer = Vec::with_capacity(capacity_hint(uncompressed_size, &payload));
                buffer.extend_from_slice(&payload[..levels_end]);
                self.decompress(
                    decompressor.as_ref(),
                    &payload[levels_end..],
                    &mut buffer,
                    uncompressed_size.saturating_sub(levels_len),
                    truncated,
                )?;
                Ok(Bytes::from(buffer))
            }
            _ => {
                let mut buffer = Vec::with_capacity(capacity_hint(uncompressed_size, &payload));
                self.decompress(
                    decompressor.as_ref(),
                    &payload,
                    &mut buffer,
                    uncompressed_size,
                    truncated,
                )?;
                Ok(Bytes::from(buffer))
            }
        }
    }

    fn decompress(
        &self,
        decompressor: &dyn Decompressor,
        input: &[u8],
        output: &mut Vec<u8>,
        uncompressed_size: usize,
        truncated: bool,
    ) -> Result<()> {
        match decompressor.decompress(input, output, uncompressed_size) {
            Ok(()) => Ok(()),
            Err(e) if truncated => {
                warn!(
                    "{} decompression of truncated page at {} failed, continuing with {} bytes: {e}",
                    self.codec,
                    self.pos,
                    output.len()
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn read(&self, range: Range<u64>) -> Result<Bytes> {
        self.chunk
            .read_at(range)
            .map_err(|e| Error::io("column chunk", e))
    }
}

/// Initial buffer size for a decompressed page. The declared size is not trusted
/// beyond a small multiple of the bytes actually present.
fn capacity_hint(uncompressed_size: usize, payload: &[u8]) -> usize {
    uncompressed_size.min(payload.len().saturating_mul(4))
}

impl Iterator for PageReader {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = try_or_ret_some_err!(self.next_page());
        page.map(Ok)
    }
}
