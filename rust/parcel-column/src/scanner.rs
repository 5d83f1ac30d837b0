//! Value-at-a-time access to a column chunk.

use parcel_common::{Result, error::Error, try_or_ret_some_err};
use parcel_encodings::data_type::DataType;

use crate::column_reader::TypedColumnReader;

/// One slot of a scanned column.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannedValue<V> {
    Present(V),
    Null,
}

impl<V> ScannedValue<V> {
    pub fn is_null(&self) -> bool {
        matches!(self, ScannedValue::Null)
    }

    pub fn into_option(self) -> Option<V> {
        match self {
            ScannedValue::Present(value) => Some(value),
            ScannedValue::Null => None,
        }
    }
}

/// Buffers batches from a [`TypedColumnReader`] and hands them out one slot at a time.
///
/// Repetition levels are read but not exposed: a repeated column scans as the flat
/// sequence of its leaf slots.
pub struct Scanner<'a, T: DataType> {
    reader: &'a mut TypedColumnReader<T>,
    batch_size: usize,
    max_def_level: i16,
    def_levels: Vec<i16>,
    rep_levels: Vec<i16>,
    values: Vec<T::Value>,
    levels_buffered: usize,
    level_offset: usize,
    value_offset: usize,
}

impl<'a, T: DataType> Scanner<'a, T> {
    /// Creates a scanner with the reader's default batch size.
    pub fn new(reader: &'a mut TypedColumnReader<T>) -> Result<Self> {
        let batch_size = reader.scanner_batch_size();
        Self::with_batch_size(reader, batch_size)
    }

    /// Creates a scanner that buffers `batch_size` slots per refill.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `batch_size` is zero.
    pub fn with_batch_size(reader: &'a mut TypedColumnReader<T>, batch_size: usize) -> Result<Self> {
        verify_batch_size(batch_size)?;
        let max_def_level = reader.descriptor().max_def_level();
        Ok(Scanner {
            reader,
            batch_size,
            max_def_level,
            def_levels: Vec::new(),
            rep_levels: Vec::new(),
            values: Vec::new(),
            levels_buffered: 0,
            level_offset: 0,
            value_offset: 0,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Changes the number of slots buffered by subsequent refills. Slots already
    /// buffered are still returned.
    pub fn set_batch_size(&mut self, batch_size: usize) -> Result<()> {
        verify_batch_size(batch_size)?;
        self.batch_size = batch_size;
        Ok(())
    }

    /// Returns `true` if another slot is available. May refill the buffer, but does not
    /// consume anything.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.level_offset < self.levels_buffered {
            return Ok(true);
        }
        self.refill()
    }

    /// Returns the next slot, or `None` once the column is exhausted.
    pub fn next_value(&mut self) -> Result<Option<ScannedValue<T::Value>>> {
        if !self.has_next()? {
            return Ok(None);
        }
        let level = if self.max_def_level > 0 {
            self.def_levels[self.level_offset]
        } else {
            0
        };
        self.level_offset += 1;
        if level < self.max_def_level {
            return Ok(Some(ScannedValue::Null));
        }
        let value = std::mem::take(&mut self.values[self.value_offset]);
        self.value_offset += 1;
        Ok(Some(ScannedValue::Present(value)))
    }

    fn refill(&mut self) -> Result<bool> {
        let batch_size = self.batch_size;
        self.values.resize(batch_size, T::Value::default());
        let descriptor = self.reader.descriptor();
        let def_levels = if descriptor.max_def_level() > 0 {
            self.def_levels.resize(batch_size, 0);
            Some(&mut self.def_levels[..])
        } else {
            None
        };
        let rep_levels = if descriptor.max_rep_level() > 0 {
            self.rep_levels.resize(batch_size, 0);
            Some(&mut self.rep_levels[..])
        } else {
            None
        };

        self.level_offset = 0;
        self.value_offset = 0;
        self.levels_buffered = 0;
        let (levels_read, _) =
            self.reader
                .read_batch(batch_size, def_levels, rep_levels, &mut self.values)?;
        self.levels_buffered = levels_read;
        Ok(levels_read > 0)
    }
}

impl<T: DataType> Iterator for Scanner<'_, T> {
    type Item = Result<ScannedValue<T::Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = try_or_ret_some_err!(self.next_value());
        value.map(Ok)
    }
}

fn verify_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(Error::invalid_arg("batch_size", "must be positive"));
    }
    Ok(())
}
