//! Minimal reader for the Thrift compact protocol, sufficient to parse page headers.
//!
//! Running out of input is reported as `ShortRead` so that callers reading from a
//! bounded window can retry with a larger one; every other malformation is a
//! `CorruptPage` error.

use parcel_common::{Result, error::Error};

const MAX_SKIP_DEPTH: usize = 32;

/// Compact protocol wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Stop,
    BoolTrue,
    BoolFalse,
    Byte,
    I16,
    I32,
    I64,
    Double,
    Binary,
    List,
    Set,
    Map,
    Struct,
}

impl FieldType {
    pub fn from_nibble(nibble: u8) -> Result<FieldType> {
        Ok(match nibble {
            0 => FieldType::Stop,
            1 => FieldType::BoolTrue,
            2 => FieldType::BoolFalse,
            3 => FieldType::Byte,
            4 => FieldType::I16,
            5 => FieldType::I32,
            6 => FieldType::I64,
            7 => FieldType::Double,
            8 => FieldType::Binary,
            9 => FieldType::List,
            10 => FieldType::Set,
            11 => FieldType::Map,
            12 => FieldType::Struct,
            _ => {
                return Err(Error::corrupt_page(format!(
                    "invalid thrift type id {nibble}"
                )));
            }
        })
    }

    pub fn to_nibble(self) -> u8 {
        match self {
            FieldType::Stop => 0,
            FieldType::BoolTrue => 1,
            FieldType::BoolFalse => 2,
            FieldType::Byte => 3,
            FieldType::I16 => 4,
            FieldType::I32 => 5,
            FieldType::I64 => 6,
            FieldType::Double => 7,
            FieldType::Binary => 8,
            FieldType::List => 9,
            FieldType::Set => 10,
            FieldType::Map => 11,
            FieldType::Struct => 12,
        }
    }
}

/// A field header within a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    pub id: i16,
    pub field_type: FieldType,
}

impl FieldHeader {
    /// For boolean fields the value is carried by the field type itself.
    pub fn bool_value(&self) -> Option<bool> {
        match self.field_type {
            FieldType::BoolTrue => Some(true),
            FieldType::BoolFalse => Some(false),
            _ => None,
        }
    }
}

/// Cursor over a compact-protocol encoded buffer.
pub struct CompactReader<'a> {
    buf: &'a [u8],
    pos: usize,
    last_field_id: i16,
    field_id_stack: Vec<i16>,
}

impl<'a> CompactReader<'a> {
    pub fn new(buf: &'a [u8]) -> CompactReader<'a> {
        CompactReader {
            buf,
            pos: 0,
            last_field_id: 0,
            field_id_stack: Vec::new(),
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_struct_begin(&mut self) {
        self.field_id_stack.push(self.last_field_id);
        self.last_field_id = 0;
    }

    pub fn read_struct_end(&mut self) {
        self.last_field_id = self.field_id_stack.pop().unwrap_or(0);
    }

    /// Reads the next field header, returning `None` at the struct's stop marker.
    pub fn read_field_begin(&mut self) -> Result<Option<FieldHeader>> {
        let byte = self.read_byte()?;
        let field_type = FieldType::from_nibble(byte & 0x0f)?;
        if field_type == FieldType::Stop {
            return Ok(None);
        }
        let delta = (byte >> 4) as i16;
        let id = if delta != 0 {
            self.last_field_id.checked_add(delta).ok_or_else(|| {
                Error::corrupt_page("thrift field id overflow")
            })?
        } else {
            self.read_i16()?
        };
        self.last_field_id = id;
        Ok(Some(FieldHeader { id, field_type }))
    }

    /// Reads a list (or set) header, returning the element type and count.
    pub fn read_list_begin(&mut self) -> Result<(FieldType, usize)> {
        let byte = self.read_byte()?;
        let element_type = FieldType::from_nibble(byte & 0x0f)?;
        let short_size = (byte >> 4) as usize;
        let size = if short_size == 15 {
            self.read_varint()? as usize
        } else {
            short_size
        };
        Ok((element_type, size))
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| self.eof_error(1))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads an unsigned LEB128 varint.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            if shift >= 64 {
                return Err(Error::corrupt_page("thrift varint too long"));
            }
            result |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let value = self.read_i64()?;
        i16::try_from(value).map_err(|_| Error::corrupt_page(format!("i16 out of range: {value}")))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let value = self.read_i64()?;
        i32::try_from(value).map_err(|_| Error::corrupt_page(format!("i32 out of range: {value}")))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let raw = self.read_varint()?;
        Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
    }

    pub fn read_double(&mut self) -> Result<f64> {
        let bytes = self.read_slice(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(raw))
    }

    pub fn read_binary(&mut self) -> Result<&'a [u8]> {
        let len = self.read_varint()? as usize;
        self.read_slice(len)
    }

    /// Reads a boolean list element (elements carry one byte each).
    pub fn read_bool_element(&mut self) -> Result<bool> {
        Ok(self.read_byte()? == 1)
    }

    /// Skips a field value of the given type.
    pub fn skip_field(&mut self, field_type: FieldType) -> Result<()> {
        self.skip(field_type, false, 0)
    }

    fn skip(&mut self, field_type: FieldType, in_collection: bool, depth: usize) -> Result<()> {
        if depth > MAX_SKIP_DEPTH {
            return Err(Error::corrupt_page("thrift nesting too deep"));
        }
        match field_type {
            FieldType::Stop => return Err(Error::corrupt_page("unexpected thrift stop")),
            FieldType::BoolTrue | FieldType::BoolFalse => {
                if in_collection {
                    self.read_byte()?;
                }
            }
            FieldType::Byte => {
                self.read_byte()?;
            }
            FieldType::I16 | FieldType::I32 | FieldType::I64 => {
                self.read_varint()?;
            }
            FieldType::Double => {
                self.read_slice(8)?;
            }
            FieldType::Binary => {
                self.read_binary()?;
            }
            FieldType::List | FieldType::Set => {
                let (element_type, size) = self.read_list_begin()?;
                for _ in 0..size {
                    self.skip(element_type, true, depth + 1)?;
                }
            }
            FieldType::Map => {
                let size = self.read_varint()? as usize;
                if size > 0 {
                    let types = self.read_byte()?;
                    let key_type = FieldType::from_nibble(types >> 4)?;
                    let value_type = FieldType::from_nibble(types & 0x0f)?;
                    for _ in 0..size {
                        self.skip(key_type, true, depth + 1)?;
                        self.skip(value_type, true, depth + 1)?;
                    }
                }
            }
            FieldType::Struct => {
                self.read_struct_begin();
                while let Some(field) = self.read_field_begin()? {
                    self.skip(field.field_type, false, depth + 1)?;
                }
                self.read_struct_end();
            }
        }
        Ok(())
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| self.eof_error(len))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn eof_error(&self, requested: usize) -> Error {
        Error::short_read(
            "thrift compact protocol",
            self.pos.saturating_add(requested),
            self.buf.len(),
        )
    }
}
