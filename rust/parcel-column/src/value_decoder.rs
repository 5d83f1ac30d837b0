//! Per-page value decoding, dispatched on the page's value encoding.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use parcel_common::{Result, error::Error};
use parcel_encodings::{
    data_type::DataType,
    dictionary::{Dictionary, DictionaryIndexDecoder},
    plain::PlainDecoder,
    rle::RleDecoder,
};
use parcel_format::{Encoding, PhysicalType};

pub(crate) enum ValueDecoder {
    Plain(PlainDecoder),
    Dictionary(DictionaryIndexDecoder),
    Rle(RleDecoder),
}

impl ValueDecoder {
    /// Creates the decoder for the values section of a data page.
    ///
    /// # Errors
    ///
    /// * `Encoding` if the encoding is not supported for `T`, or if the page is
    ///   dictionary-encoded and the chunk carried no dictionary page.
    /// * `ShortRead` if the length prefix of an `RLE` boolean section is cut off.
    pub fn new<T: DataType>(
        encoding: Encoding,
        values: Bytes,
        type_length: i32,
        has_dictionary: bool,
    ) -> Result<ValueDecoder> {
        match encoding {
            Encoding::Plain => Ok(ValueDecoder::Plain(PlainDecoder::new(values, type_length))),
            Encoding::PlainDictionary | Encoding::RleDictionary => {
                if !has_dictionary {
                    return Err(Error::encoding(format!(
                        "{encoding} data page without a dictionary page"
                    )));
                }
                Ok(ValueDecoder::Dictionary(DictionaryIndexDecoder::new(values)))
            }
            Encoding::Rle if T::PHYSICAL_TYPE == PhysicalType::Boolean => {
                if values.len() < 4 {
                    return Err(Error::short_read("RLE values length prefix", 4, values.len()));
                }
                let len = LittleEndian::read_u32(&values[..4]) as usize;
                let end = len.saturating_add(4).min(values.len());
                Ok(ValueDecoder::Rle(RleDecoder::new(1, values.slice(4..end))?))
            }
            other => Err(Error::encoding(format!(
                "unsupported value encoding {other} for {}",
                T::PHYSICAL_TYPE
            ))),
        }
    }

    /// Decodes the next `out.len()` non-null values.
    pub fn decode<T: DataType>(
        &mut self,
        dictionary: Option<&Dictionary<T::Value>>,
        out: &mut [T::Value],
    ) -> Result<()> {
        if out.is_empty() {
            return Ok(());
        }
        match self {
            ValueDecoder::Plain(decoder) => T::decode_plain(decoder, out),
            ValueDecoder::Dictionary(decoder) => {
                let dictionary = dictionary
                    .ok_or_else(|| Error::encoding("dictionary-encoded values without a dictionary"))?;
                decoder.decode(dictionary, out)
            }
            ValueDecoder::Rle(decoder) => T::decode_rle(decoder, out),
        }
    }
}
