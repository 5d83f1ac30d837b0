//! Dictionary encoding, decode side.
//!
//! A dictionary page holds the distinct values of the column chunk, plain-encoded.
//! Dictionary-encoded data pages hold a one-byte index bit width followed by a hybrid
//! stream of indices into that dictionary.

use bytes::Bytes;
use parcel_common::{Result, error::Error};

use crate::{data_type::DataType, plain::PlainDecoder, rle::RleDecoder};

/// Materialized dictionary values, addressed by index.
#[derive(Debug, Clone)]
pub struct Dictionary<V> {
    values: Vec<V>,
}

impl<V: Clone> Dictionary<V> {
    pub fn new(values: Vec<V>) -> Dictionary<V> {
        Dictionary { values }
    }

    /// Decodes a dictionary page payload.
    ///
    /// # Arguments
    ///
    /// * `data` - The decompressed dictionary page.
    /// * `num_values` - Number of entries declared by the page header.
    /// * `type_length` - Width of `FIXED_LEN_BYTE_ARRAY` values.
    ///
    /// # Errors
    ///
    /// Returns `ShortRead` if the page holds fewer than `num_values` entries. A count
    /// the payload cannot possibly hold is rejected before anything is allocated.
    pub fn decode<T>(data: Bytes, num_values: usize, type_length: i32) -> Result<Dictionary<V>>
    where
        T: DataType<Value = V>,
        V: Default,
    {
        let capacity = data.len().saturating_mul(8) / T::min_plain_bits(type_length).max(1);
        if num_values > capacity {
            return Err(Error::short_read(
                format!("dictionary page of {} values", T::PHYSICAL_TYPE),
                num_values,
                capacity,
            ));
        }
        let mut values: Vec<V> = vec![V::default(); num_values];
        let mut decoder = PlainDecoder::new(data, type_length);
        T::decode_plain(&mut decoder, &mut values)?;
        Ok(Dictionary { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&V> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }
}

/// Decodes the index stream of a dictionary-encoded data page and resolves indices
/// against a [`Dictionary`].
pub struct DictionaryIndexDecoder {
    state: IndexState,
    indices: Vec<u32>,
}

enum IndexState {
    /// The bit width byte has not been read yet.
    Pending(Bytes),
    Decoding(RleDecoder),
}

impl DictionaryIndexDecoder {
    /// Creates a decoder over the values section of a data page. The leading bit width
    /// byte is read on first use, so an empty section only fails once values are
    /// requested.
    pub fn new(data: Bytes) -> DictionaryIndexDecoder {
        DictionaryIndexDecoder {
            state: IndexState::Pending(data),
            indices: Vec::new(),
        }
    }

    fn decoder(&mut self) -> Result<&mut RleDecoder> {
        if let IndexState::Pending(data) = &self.state {
            let Some(&bit_width) = data.first() else {
                return Err(Error::short_read("dictionary index bit width", 1, 0));
            };
            if bit_width > 32 {
                return Err(Error::corrupt_page(format!(
                    "invalid dictionary index bit width {bit_width}"
                )));
            }
            let stream = data.slice(1..);
            self.state = IndexState::Decoding(RleDecoder::new(bit_width, stream)?);
        }
        match &mut self.state {
            IndexState::Decoding(decoder) => Ok(decoder),
            IndexState::Pending(_) => Err(Error::invalid_operation("dictionary index decoder")),
        }
    }

    /// Fills `out` with the raw dictionary indices of the next `out.len()` values.
    pub fn decode_indices(&mut self, out: &mut [u32]) -> Result<()> {
        let decoded = self.decoder()?.get_batch(out);
        if decoded < out.len() {
            return Err(Error::short_read(
                "dictionary indices",
                out.len(),
                decoded,
            ));
        }
        Ok(())
    }

    /// Fills `out` with the dictionary values of the next `out.len()` indices.
    ///
    /// # Errors
    ///
    /// * `ShortRead` if the index stream ends early.
    /// * `CorruptPage` if an index is outside the dictionary.
    pub fn decode<V: Clone>(&mut self, dictionary: &Dictionary<V>, out: &mut [V]) -> Result<()> {
        let mut indices = std::mem::take(&mut self.indices);
        indices.resize(out.len(), 0);
        let result = self.decode_indices(&mut indices).and_then(|()| {
            for (slot, &index) in out.iter_mut().zip(indices.iter()) {
                *slot = dictionary.get(index as usize).cloned().ok_or_else(|| {
                    Error::corrupt_page(format!(
                        "dictionary index {index} out of range for {} entries",
                        dictionary.len()
                    ))
                })?;
            }
            Ok(())
        });
        self.indices = indices;
        result
    }
}
