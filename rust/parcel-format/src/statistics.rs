use bytes::Bytes;

/// Min/max and count statistics, attached to a column chunk or to a single page.
///
/// Min and max are kept in their plain-encoded byte form; interpreting them requires
/// the column's physical type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub min: Option<Bytes>,
    pub max: Option<Bytes>,
    pub null_count: Option<i64>,
    pub distinct_count: Option<i64>,
}

impl Statistics {
    /// Returns `true` if any statistic was recorded by the writer.
    pub fn is_set(&self) -> bool {
        self.min.is_some()
            || self.max.is_some()
            || self.null_count.is_some()
            || self.distinct_count.is_some()
    }

    /// Returns `true` if both bounds are present.
    pub fn has_min_max(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}
