//! Typed column readers: decode definition levels, repetition levels and values of a
//! column chunk in batches, across page boundaries.

use bytes::Bytes;
use log::{debug, trace, warn};
use parcel_common::{Result, error::Error, verify_arg};
use parcel_encodings::{
    data_type::{
        BoolType, ByteArrayType, DataType, DoubleType, FixedLenByteArrayType, FloatType,
        Int32Type, Int64Type, Int96Type,
    },
    dictionary::Dictionary,
    levels::LevelDecoder,
};
use parcel_format::{
    Encoding, PhysicalType,
    descriptor::{ColumnDescPtr, ColumnDescriptor},
    page_header::{DataPageHeader, DataPageHeaderV2, DictionaryPageHeader, PageBody},
};

use crate::{
    page::Page, page_reader::PageReader, properties::ReaderProperties,
    value_decoder::ValueDecoder,
};

/// Reads the levels and values of one column chunk as the Rust type of its physical
/// type `T`.
///
/// The reader owns the chunk's [`PageReader`] and, once the dictionary page has been
/// seen, its [`Dictionary`]. Pages are pulled lazily, one at a time, as batches
/// are requested.
pub struct TypedColumnReader<T: DataType> {
    descriptor: ColumnDescPtr,
    pages: PageReader,
    total_values: u64,
    values_consumed: u64,
    state: ReadState,
    dictionary: Option<Dictionary<T::Value>>,
    seen_data_page: bool,
    scanner_batch_size: usize,
}

enum ReadState {
    AwaitingPage,
    DecodingPage(PageState),
    Exhausted,
}

struct PageState {
    remaining: usize,
    def_levels: LevelDecoder,
    rep_levels: LevelDecoder,
    values: ValueDecoder,
}

impl<T: DataType> TypedColumnReader<T> {
    /// Creates a reader over a column chunk.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - The column's descriptor; its physical type must be `T`'s.
    /// * `pages` - The page stream of the chunk.
    /// * `total_values` - Number of level slots declared for the chunk by its metadata.
    ///   Reads never go past it.
    /// * `properties` - Reader options.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the descriptor's physical type differs from `T`'s.
    pub fn new(
        descriptor: ColumnDescPtr,
        pages: PageReader,
        total_values: i64,
        properties: &ReaderProperties,
    ) -> Result<Self> {
        if descriptor.physical_type() != T::PHYSICAL_TYPE {
            return Err(Error::type_mismatch(
                T::PHYSICAL_TYPE.name(),
                descriptor.physical_type().name(),
            ));
        }
        Ok(TypedColumnReader {
            descriptor,
            pages,
            total_values: total_values.max(0) as u64,
            values_consumed: 0,
            state: ReadState::AwaitingPage,
            dictionary: None,
            seen_data_page: false,
            scanner_batch_size: properties.scanner_batch_size(),
        })
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    /// Number of level slots declared for the chunk.
    pub fn total_values(&self) -> u64 {
        self.total_values
    }

    /// Number of level slots read so far.
    pub fn values_consumed(&self) -> u64 {
        self.values_consumed
    }

    /// The chunk's dictionary, once its dictionary page has been read.
    pub fn dictionary(&self) -> Option<&Dictionary<T::Value>> {
        self.dictionary.as_ref()
    }

    pub fn page_reader(&self) -> &PageReader {
        &self.pages
    }

    /// Default batch size for scanners created over this reader.
    pub fn scanner_batch_size(&self) -> usize {
        self.scanner_batch_size
    }

    /// Returns `true` if at least one more level slot can be read.
    ///
    /// May load the next page, but never consumes levels or values. A failure to load
    /// the page leaves the reader exhausted.
    pub fn has_next(&mut self) -> Result<bool> {
        let result = self.advance();
        self.stop_on_error(&result);
        result
    }

    fn advance(&mut self) -> Result<bool> {
        loop {
            if self.values_consumed >= self.total_values {
                self.state = ReadState::Exhausted;
                return Ok(false);
            }
            match &self.state {
                ReadState::Exhausted => return Ok(false),
                ReadState::DecodingPage(page) if page.remaining > 0 => return Ok(true),
                ReadState::DecodingPage(_) | ReadState::AwaitingPage => self.load_next_page()?,
            }
        }
    }

    /// Reads up to `batch_size` level slots.
    ///
    /// Non-null values (slots whose definition level equals the column's maximum) are
    /// packed from the start of `values`. Reading continues across page boundaries
    /// until `batch_size` slots are read or the chunk ends.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Maximum number of level slots to read.
    /// * `def_levels` - Receives definition levels. Required when the column's maximum
    ///   definition level is positive; filled with zeros otherwise.
    /// * `rep_levels` - Receives repetition levels, with the same rules.
    /// * `values` - Receives the non-null values.
    ///
    /// # Returns
    ///
    /// `(levels_read, values_read)`. Both are zero once the chunk is exhausted.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` if `batch_size` is zero, a buffer is shorter than
    ///   `batch_size`, or a required level buffer is missing.
    /// * `ShortRead`, `CorruptPage`, `Encoding` or `Codec` from page decoding. Levels
    ///   and values decoded before the failure remain in the buffers, and the reader
    ///   is exhausted afterwards.
    pub fn read_batch(
        &mut self,
        batch_size: usize,
        def_levels: Option<&mut [i16]>,
        rep_levels: Option<&mut [i16]>,
        values: &mut [T::Value],
    ) -> Result<(usize, usize)> {
        verify_arg!(batch_size, batch_size > 0);
        verify_arg!(values, values.len() >= batch_size);
        self.verify_level_buffer(
            "def_levels",
            def_levels.as_deref(),
            self.descriptor.max_def_level(),
            batch_size,
        )?;
        self.verify_level_buffer(
            "rep_levels",
            rep_levels.as_deref(),
            self.descriptor.max_rep_level(),
            batch_size,
        )?;

        let result = self.fill_batch(batch_size, def_levels, rep_levels, values);
        self.stop_on_error(&result);
        result
    }

    fn fill_batch(
        &mut self,
        batch_size: usize,
        mut def_levels: Option<&mut [i16]>,
        mut rep_levels: Option<&mut [i16]>,
        values: &mut [T::Value],
    ) -> Result<(usize, usize)> {
        let max_def_level = self.descriptor.max_def_level();
        let mut levels_read = 0;
        let mut values_read = 0;
        while levels_read < batch_size && self.advance()? {
            let chunk_remaining = self.total_values - self.values_consumed;
            let ReadState::DecodingPage(page) = &mut self.state else {
                break;
            };
            let count = (batch_size - levels_read)
                .min(page.remaining)
                .min(chunk_remaining.min(usize::MAX as u64) as usize);
            let range = levels_read..levels_read + count;

            let non_null = match def_levels.as_deref_mut() {
                Some(def_levels) => {
                    let def_levels = &mut def_levels[range.clone()];
                    page.def_levels.decode(def_levels)?;
                    def_levels
                        .iter()
                        .filter(|&&level| level == max_def_level)
                        .count()
                }
                None => count,
            };
            if let Some(rep_levels) = rep_levels.as_deref_mut() {
                page.rep_levels.decode(&mut rep_levels[range])?;
            }
            page.values.decode::<T>(
                self.dictionary.as_ref(),
                &mut values[values_read..values_read + non_null],
            )?;

            page.remaining -= count;
            self.values_consumed += count as u64;
            levels_read += count;
            values_read += non_null;
        }
        Ok((levels_read, values_read))
    }

    /// Levels and values of the current page may be out of step after a failed
    /// decode, so nothing more is read from the chunk.
    fn stop_on_error<R>(&mut self, result: &Result<R>) {
        if let Err(e) = result {
            if !matches!(self.state, ReadState::Exhausted) {
                warn!("column {}: stopping after error: {e}", self.descriptor.path());
                self.state = ReadState::Exhausted;
            }
        }
    }

    fn verify_level_buffer(
        &self,
        name: &str,
        buffer: Option<&[i16]>,
        max_level: i16,
        batch_size: usize,
    ) -> Result<()> {
        match buffer {
            Some(buffer) if buffer.len() < batch_size => Err(Error::invalid_arg(
                name,
                format!("buffer of {} levels for a batch of {batch_size}", buffer.len()),
            )),
            None if max_level > 0 => Err(Error::invalid_arg(
                name,
                format!(
                    "required for column {} with max level {max_level}",
                    self.descriptor.path()
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Pulls pages until a non-empty data page is found or the chunk ends.
    fn load_next_page(&mut self) -> Result<()> {
        loop {
            let Some(page) = self.pages.next_page()? else {
                trace!("column {} exhausted", self.descriptor.path());
                self.state = ReadState::Exhausted;
                return Ok(());
            };
            match page.body() {
                PageBody::Dictionary(header) => self.read_dictionary_page(&page, header)?,
                PageBody::Data(header) => {
                    self.seen_data_page = true;
                    if page.num_values() == 0 {
                        trace!("skipping empty data page at {}", page.offset());
                        continue;
                    }
                    self.state = ReadState::DecodingPage(self.data_page(&page, header)?);
                    return Ok(());
                }
                PageBody::DataV2(header) => {
                    self.seen_data_page = true;
                    if page.num_values() == 0 {
                        trace!("skipping empty data page at {}", page.offset());
                        continue;
                    }
                    self.state = ReadState::DecodingPage(self.data_page_v2(&page, header)?);
                    return Ok(());
                }
                PageBody::Index => continue,
            }
        }
    }

    fn read_dictionary_page(&mut self, page: &Page, header: &DictionaryPageHeader) -> Result<()> {
        if self.dictionary.is_some() {
            return Err(Error::corrupt_page(format!(
                "column {} has more than one dictionary page",
                self.descriptor.path()
            )));
        }
        if self.seen_data_page {
            return Err(Error::corrupt_page(format!(
                "dictionary page after data pages in column {}",
                self.descriptor.path()
            )));
        }
        if !matches!(header.encoding, Encoding::Plain | Encoding::PlainDictionary) {
            return Err(Error::encoding(format!(
                "unsupported dictionary page encoding {}",
                header.encoding
            )));
        }
        let dictionary = Dictionary::decode::<T>(
            page.buffer().clone(),
            header.num_values as usize,
            self.descriptor.type_length(),
        )?;
        debug!(
            "column {}: dictionary of {} {} values",
            self.descriptor.path(),
            dictionary.len(),
            T::PHYSICAL_TYPE
        );
        self.dictionary = Some(dictionary);
        Ok(())
    }

    /// Data page v1: repetition levels, definition levels and values, back to back.
    fn data_page(&self, page: &Page, header: &DataPageHeader) -> Result<PageState> {
        let buffer = page.buffer();
        let num_values = page.num_values();
        let (rep_levels, rep_len) = LevelDecoder::new_v1(
            header.repetition_level_encoding,
            self.descriptor.max_rep_level(),
            num_values,
            buffer,
        )?;
        let rest = tail(buffer, rep_len);
        let (def_levels, def_len) = LevelDecoder::new_v1(
            header.definition_level_encoding,
            self.descriptor.max_def_level(),
            num_values,
            &rest,
        )?;
        let values = self.value_decoder(header.encoding, tail(&rest, def_len))?;
        Ok(PageState {
            remaining: num_values,
            def_levels,
            rep_levels,
            values,
        })
    }

    /// Data page v2: level section lengths come from the header and carry no prefix.
    fn data_page_v2(&self, page: &Page, header: &DataPageHeaderV2) -> Result<PageState> {
        let buffer = page.buffer();
        let rep_len = header.repetition_levels_byte_length as usize;
        let def_len = header.definition_levels_byte_length as usize;
        let rep_levels = LevelDecoder::new_v2(
            self.descriptor.max_rep_level(),
            buffer.slice(..rep_len.min(buffer.len())),
        )?;
        let rest = tail(buffer, rep_len);
        let def_levels = LevelDecoder::new_v2(
            self.descriptor.max_def_level(),
            rest.slice(..def_len.min(rest.len())),
        )?;
        let values = self.value_decoder(header.encoding, tail(&rest, def_len))?;
        Ok(PageState {
            remaining: page.num_values(),
            def_levels,
            rep_levels,
            values,
        })
    }

    fn value_decoder(&self, encoding: Encoding, values: Bytes) -> Result<ValueDecoder> {
        ValueDecoder::new::<T>(
            encoding,
            values,
            self.descriptor.type_length(),
            self.dictionary.is_some(),
        )
    }
}

/// Bytes of `buffer` after the first `offset`, empty if `offset` runs past the end.
fn tail(buffer: &Bytes, offset: usize) -> Bytes {
    buffer.slice(offset.min(buffer.len())..)
}

/// A [`DataType`] with a [`ColumnReader`] variant.
pub trait ColumnValueType: DataType + Sized {
    fn wrap(reader: TypedColumnReader<Self>) -> ColumnReader;

    /// Returns the typed reader, or gives `reader` back if it holds another type.
    fn try_unwrap(reader: ColumnReader) -> std::result::Result<TypedColumnReader<Self>, ColumnReader>;
}

macro_rules! column_readers {
    ($($variant:ident => $data_type:ty, $physical:ident;)*) => {
        /// A column reader whose physical type is only known at runtime.
        pub enum ColumnReader {
            $($variant(TypedColumnReader<$data_type>),)*
        }

        impl ColumnReader {
            /// Creates the reader variant matching the descriptor's physical type.
            pub fn new(
                descriptor: ColumnDescPtr,
                pages: PageReader,
                total_values: i64,
                properties: &ReaderProperties,
            ) -> Result<ColumnReader> {
                match descriptor.physical_type() {
                    $(PhysicalType::$physical => Ok(ColumnReader::$variant(
                        TypedColumnReader::new(descriptor, pages, total_values, properties)?,
                    )),)*
                }
            }

            pub fn physical_type(&self) -> PhysicalType {
                match self {
                    $(ColumnReader::$variant(_) => PhysicalType::$physical,)*
                }
            }

            pub fn descriptor(&self) -> &ColumnDescriptor {
                match self {
                    $(ColumnReader::$variant(reader) => reader.descriptor(),)*
                }
            }

            pub fn has_next(&mut self) -> Result<bool> {
                match self {
                    $(ColumnReader::$variant(reader) => reader.has_next(),)*
                }
            }
        }

        $(
            impl ColumnValueType for $data_type {
                fn wrap(reader: TypedColumnReader<Self>) -> ColumnReader {
                    ColumnReader::$variant(reader)
                }

                fn try_unwrap(
                    reader: ColumnReader,
                ) -> std::result::Result<TypedColumnReader<Self>, ColumnReader> {
                    match reader {
                        ColumnReader::$variant(reader) => Ok(reader),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

column_readers! {
    BoolColumnReader => BoolType, Boolean;
    Int32ColumnReader => Int32Type, Int32;
    Int64ColumnReader => Int64Type, Int64;
    Int96ColumnReader => Int96Type, Int96;
    FloatColumnReader => FloatType, Float;
    DoubleColumnReader => DoubleType, Double;
    ByteArrayColumnReader => ByteArrayType, ByteArray;
    FixedLenByteArrayColumnReader => FixedLenByteArrayType, FixedLenByteArray;
}

impl ColumnReader {
    /// Converts into the typed reader for `T`.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the column's physical type is not `T`'s.
    pub fn into_typed<T: ColumnValueType>(self) -> Result<TypedColumnReader<T>> {
        T::try_unwrap(self).map_err(|reader| {
            Error::type_mismatch(T::PHYSICAL_TYPE.name(), reader.physical_type().name())
        })
    }
}

impl<T: ColumnValueType> From<TypedColumnReader<T>> for ColumnReader {
    fn from(reader: TypedColumnReader<T>) -> ColumnReader {
        T::wrap(reader)
    }
}
