//! Column chunk construction.

use parcel_format::{
    CompressionCodec, Encoding, PageType,
    descriptor::ColumnDescPtr,
    metadata::ColumnChunkMetaData,
    page_header::{DataPageHeader, DataPageHeaderV2, DictionaryPageHeader, PageBody, PageHeader},
    statistics::Statistics,
};

use crate::{
    compress::compress,
    encode::{self, PlainEncode},
    thrift::write_page_header,
};

/// The serialized pages of a column chunk plus what its metadata needs.
///
/// Offsets are relative to the start of `data`.
#[derive(Debug, Clone)]
pub struct ColumnChunk {
    pub descriptor: ColumnDescPtr,
    pub codec: CompressionCodec,
    pub data: Vec<u8>,
    pub dictionary_page_offset: Option<u64>,
    pub data_page_offset: u64,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    /// Chunk length recorded in the metadata; normally `data.len()`.
    pub total_compressed_size: i64,
    pub encodings: Vec<Encoding>,
    pub statistics: Option<Statistics>,
    /// Length of each page header, in page order.
    pub header_lengths: Vec<usize>,
}

impl ColumnChunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Metadata describing this chunk stored at `offset` within a file.
    pub fn metadata_at(&self, offset: u64) -> ColumnChunkMetaData {
        ColumnChunkMetaData::builder(self.descriptor.clone())
            .codec(self.codec)
            .encodings(self.encodings.clone())
            .num_values(self.num_values)
            .total_uncompressed_size(self.total_uncompressed_size)
            .total_compressed_size(self.total_compressed_size)
            .data_page_offset((offset + self.data_page_offset) as i64)
            .dictionary_page_offset(
                self.dictionary_page_offset
                    .map(|dict| (offset + dict) as i64),
            )
            .statistics(self.statistics.clone())
            .build()
            .expect("chunk metadata")
    }
}

/// Appends pages to a column chunk, encoding levels and compressing payloads
/// according to the column descriptor and chunk codec.
pub struct ColumnChunkBuilder {
    chunk: ColumnChunk,
    has_data_page: bool,
}

impl ColumnChunkBuilder {
    pub fn new(descriptor: ColumnDescPtr) -> ColumnChunkBuilder {
        ColumnChunkBuilder {
            chunk: ColumnChunk {
                descriptor,
                codec: CompressionCodec::Uncompressed,
                data: Vec::new(),
                dictionary_page_offset: None,
                data_page_offset: 0,
                num_values: 0,
                total_uncompressed_size: 0,
                total_compressed_size: 0,
                encodings: Vec::new(),
                statistics: None,
                header_lengths: Vec::new(),
            },
            has_data_page: false,
        }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.chunk.codec = codec;
        self
    }

    pub fn with_statistics(mut self, statistics: Statistics) -> Self {
        self.chunk.statistics = Some(statistics);
        self
    }

    /// Appends a `PLAIN` encoded dictionary page.
    pub fn dictionary_page<V: PlainEncode>(&mut self, values: &[V]) -> &mut Self {
        let body = encode::plain(values);
        let payload = compress(self.chunk.codec, &body);
        let header = PageHeader {
            page_type: PageType::DictionaryPage,
            uncompressed_page_size: body.len() as i32,
            compressed_page_size: payload.len() as i32,
            crc: None,
            body: PageBody::Dictionary(DictionaryPageHeader {
                num_values: values.len() as i32,
                encoding: Encoding::Plain,
                is_sorted: false,
            }),
        };
        if self.chunk.dictionary_page_offset.is_none() {
            self.chunk.dictionary_page_offset = Some(self.chunk.data.len() as u64);
        }
        self.add_encoding(Encoding::Plain);
        self.append(&header, &payload);
        self
    }

    /// Appends a data page.
    pub fn data_page(&mut self, page: DataPageBuilder) -> &mut Self {
        let descriptor = self.chunk.descriptor.clone();
        let max_def = descriptor.max_def_level();
        let max_rep = descriptor.max_rep_level();
        let num_values = page.num_values();
        let def_levels = page
            .def_levels
            .clone()
            .unwrap_or_else(|| vec![max_def; num_values]);
        let rep_levels = page
            .rep_levels
            .clone()
            .unwrap_or_else(|| vec![0; num_values]);

        let (header, payload) = if page.v2 {
            let rep = if max_rep > 0 {
                encode::rle_levels(max_rep, &rep_levels)
            } else {
                Vec::new()
            };
            let def = if max_def > 0 {
                encode::rle_levels(max_def, &def_levels)
            } else {
                Vec::new()
            };
            let is_compressed =
                page.is_compressed && self.chunk.codec != CompressionCodec::Uncompressed;
            let values = if is_compressed {
                compress(self.chunk.codec, &page.values)
            } else {
                page.values.clone()
            };
            let mut payload = rep.clone();
            payload.extend_from_slice(&def);
            payload.extend(values);
            let header = PageHeader {
                page_type: PageType::DataPageV2,
                uncompressed_page_size: (rep.len() + def.len() + page.values.len()) as i32,
                compressed_page_size: payload.len() as i32,
                crc: None,
                body: PageBody::DataV2(DataPageHeaderV2 {
                    num_values: num_values as i32,
                    num_nulls: def_levels.iter().filter(|&&d| d < max_def).count() as i32,
                    num_rows: rep_levels.iter().filter(|&&r| r == 0).count() as i32,
                    encoding: page.encoding,
                    definition_levels_byte_length: def.len() as i32,
                    repetition_levels_byte_length: rep.len() as i32,
                    is_compressed: page.is_compressed,
                    statistics: page.statistics.clone(),
                }),
            };
            self.add_encoding(Encoding::Rle);
            (header, payload)
        } else {
            let mut body = Vec::new();
            body.extend(v1_levels(page.level_encoding, max_rep, &rep_levels));
            body.extend(v1_levels(page.level_encoding, max_def, &def_levels));
            body.extend_from_slice(&page.values);
            let payload = compress(self.chunk.codec, &body);
            let header = PageHeader {
                page_type: PageType::DataPage,
                uncompressed_page_size: body.len() as i32,
                compressed_page_size: payload.len() as i32,
                crc: None,
                body: PageBody::Data(DataPageHeader {
                    num_values: num_values as i32,
                    encoding: page.encoding,
                    definition_level_encoding: page.level_encoding,
                    repetition_level_encoding: page.level_encoding,
                    statistics: page.statistics.clone(),
                }),
            };
            self.add_encoding(page.level_encoding);
            (header, payload)
        };

        self.mark_data_page();
        self.add_encoding(page.encoding);
        self.chunk.num_values += num_values as i64;
        self.append(&header, &payload);
        self
    }

    /// Appends a page with a caller-provided header, written verbatim. The declared
    /// sizes in `header` need not match `payload`.
    pub fn raw_page(&mut self, header: &PageHeader, payload: &[u8]) -> &mut Self {
        match &header.body {
            PageBody::Data(_) | PageBody::DataV2(_) => {
                self.mark_data_page();
                self.chunk.num_values += header.num_values() as i64;
            }
            PageBody::Dictionary(_) if self.chunk.dictionary_page_offset.is_none() => {
                self.chunk.dictionary_page_offset = Some(self.chunk.data.len() as u64);
            }
            _ => (),
        }
        self.append(header, payload);
        self
    }

    /// Appends bytes that are not a page.
    pub fn raw_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.chunk.data.extend_from_slice(bytes);
        self
    }

    pub fn finish(mut self) -> ColumnChunk {
        self.chunk.total_compressed_size = self.chunk.data.len() as i64;
        self.chunk
    }

    fn mark_data_page(&mut self) {
        if !self.has_data_page {
            self.chunk.data_page_offset = self.chunk.data.len() as u64;
            self.has_data_page = true;
        }
    }

    fn add_encoding(&mut self, encoding: Encoding) {
        if !self.chunk.encodings.contains(&encoding) {
            self.chunk.encodings.push(encoding);
        }
    }

    fn append(&mut self, header: &PageHeader, payload: &[u8]) {
        let header_bytes = write_page_header(header);
        self.chunk.header_lengths.push(header_bytes.len());
        self.chunk.total_uncompressed_size +=
            (header_bytes.len() + header.uncompressed_page_size.max(0) as usize) as i64;
        self.chunk.data.extend(header_bytes);
        self.chunk.data.extend_from_slice(payload);
    }
}

fn v1_levels(encoding: Encoding, max_level: i16, levels: &[i16]) -> Vec<u8> {
    if max_level == 0 {
        return Vec::new();
    }
    match encoding {
        Encoding::BitPacked => encode::bit_packed_levels(max_level, levels),
        _ => encode::rle_levels_v1(max_level, levels),
    }
}

/// Describes one data page for [`ColumnChunkBuilder::data_page`].
///
/// Without explicit levels every slot is defined and starts a new row.
#[derive(Debug, Clone)]
pub struct DataPageBuilder {
    num_values: usize,
    encoding: Encoding,
    values: Vec<u8>,
    def_levels: Option<Vec<i16>>,
    rep_levels: Option<Vec<i16>>,
    level_encoding: Encoding,
    v2: bool,
    is_compressed: bool,
    statistics: Option<Statistics>,
}

impl DataPageBuilder {
    /// A page of `PLAIN` encoded values.
    pub fn plain<V: PlainEncode>(values: &[V]) -> DataPageBuilder {
        Self::encoded(Encoding::Plain, encode::plain(values), values.len())
    }

    /// An `RLE_DICTIONARY` page of indices into a dictionary of `dictionary_len`
    /// entries.
    pub fn dictionary_indices(dictionary_len: usize, indices: &[u32]) -> DataPageBuilder {
        Self::encoded(
            Encoding::RleDictionary,
            encode::dictionary_indices(dictionary_len, indices),
            indices.len(),
        )
    }

    /// A page whose values section is `values`, already encoded with `encoding`.
    pub fn encoded(encoding: Encoding, values: Vec<u8>, num_values: usize) -> DataPageBuilder {
        DataPageBuilder {
            num_values,
            encoding,
            values,
            def_levels: None,
            rep_levels: None,
            level_encoding: Encoding::Rle,
            v2: false,
            is_compressed: true,
            statistics: None,
        }
    }

    /// Sets the definition levels; the page then has one slot per level.
    pub fn with_def_levels(mut self, levels: &[i16]) -> Self {
        self.num_values = levels.len();
        self.def_levels = Some(levels.to_vec());
        self
    }

    pub fn with_rep_levels(mut self, levels: &[i16]) -> Self {
        self.num_values = levels.len();
        self.rep_levels = Some(levels.to_vec());
        self
    }

    /// Overrides the value encoding recorded in the header.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Writes data page v1 levels in the deprecated `BIT_PACKED` encoding.
    pub fn bit_packed_levels(mut self) -> Self {
        self.level_encoding = Encoding::BitPacked;
        self
    }

    /// Writes a data page v2.
    pub fn v2(mut self) -> Self {
        self.v2 = true;
        self
    }

    /// For data pages v2, whether the values section is compressed.
    pub fn with_is_compressed(mut self, is_compressed: bool) -> Self {
        self.is_compressed = is_compressed;
        self
    }

    pub fn with_statistics(mut self, statistics: Statistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn num_values(&self) -> usize {
        self.num_values
    }
}
