use std::{fmt, sync::Arc};

use parcel_common::{Result, error::Error, verify_arg};

use crate::types::PhysicalType;

/// Dotted path of a leaf column within the (flattened) schema tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPath(Vec<String>);

impl ColumnPath {
    pub fn new(parts: Vec<String>) -> ColumnPath {
        ColumnPath(parts)
    }

    /// Returns the individual path components, root first.
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Returns the leaf name, i.e. the last path component.
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }
}

impl From<&str> for ColumnPath {
    fn from(path: &str) -> ColumnPath {
        ColumnPath(path.split('.').map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ColumnPath {
    fn from(parts: Vec<String>) -> ColumnPath {
        ColumnPath(parts)
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Shared handle to a column descriptor.
pub type ColumnDescPtr = Arc<ColumnDescriptor>;

/// Describes a leaf column: its physical type and the maximum definition and
/// repetition levels implied by the optional/repeated ancestors in its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    path: ColumnPath,
    physical_type: PhysicalType,
    type_length: i32,
    max_def_level: i16,
    max_rep_level: i16,
}

impl ColumnDescriptor {
    /// Creates a descriptor for a column of any physical type.
    ///
    /// # Arguments
    ///
    /// * `path` - Dotted path of the leaf column.
    /// * `physical_type` - Storage type of the values.
    /// * `type_length` - Byte width of each value; required (and must be positive)
    ///   for `FIXED_LEN_BYTE_ARRAY`, ignored otherwise.
    /// * `max_def_level` - Maximum definition level, zero for required columns.
    /// * `max_rep_level` - Maximum repetition level, zero for non-repeated columns.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a level is negative or the fixed width is missing.
    pub fn try_new(
        path: impl Into<ColumnPath>,
        physical_type: PhysicalType,
        type_length: Option<i32>,
        max_def_level: i16,
        max_rep_level: i16,
    ) -> Result<ColumnDescriptor> {
        verify_arg!(max_def_level, max_def_level >= 0);
        verify_arg!(max_rep_level, max_rep_level >= 0);
        let type_length = if physical_type == PhysicalType::FixedLenByteArray {
            match type_length {
                Some(len) if len > 0 => len,
                _ => {
                    return Err(Error::invalid_arg(
                        "type_length",
                        "FIXED_LEN_BYTE_ARRAY requires a positive width",
                    ));
                }
            }
        } else {
            type_length.unwrap_or(-1)
        };
        Ok(ColumnDescriptor {
            path: path.into(),
            physical_type,
            type_length,
            max_def_level,
            max_rep_level,
        })
    }

    /// Creates a descriptor for a required, non-repeated column.
    pub fn required(path: impl Into<ColumnPath>, physical_type: PhysicalType) -> Result<Self> {
        Self::try_new(path, physical_type, None, 0, 0)
    }

    /// Creates a descriptor for an optional, non-repeated column.
    pub fn optional(path: impl Into<ColumnPath>, physical_type: PhysicalType) -> Result<Self> {
        Self::try_new(path, physical_type, None, 1, 0)
    }

    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    /// Byte width of `FIXED_LEN_BYTE_ARRAY` values, `-1` for other types.
    pub fn type_length(&self) -> i32 {
        self.type_length
    }

    pub fn max_def_level(&self) -> i16 {
        self.max_def_level
    }

    pub fn max_rep_level(&self) -> i16 {
        self.max_rep_level
    }

    /// Returns `true` if some slots of this column may have no value
    /// (the column is optional or nested under a repeated/optional ancestor).
    pub fn is_nullable(&self) -> bool {
        self.max_def_level > 0
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (max_def={}, max_rep={})",
            self.path, self.physical_type, self.max_def_level, self.max_rep_level
        )
    }
}
