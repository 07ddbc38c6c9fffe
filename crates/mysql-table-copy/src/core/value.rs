//! Raw row representation for text-protocol transfers.
//!
//! Values are kept as the bytes the server sent; no type conversion happens
//! between extraction and literal encoding.

/// A single column value as read from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// SQL NULL.
    Null,
    /// Present, zero-length value (empty string).
    Empty,
    /// Present, non-empty raw bytes.
    Bytes(Vec<u8>),
}

impl RawValue {
    /// Build from a driver cell: `None` is NULL, an empty slice is `Empty`.
    pub fn from_cell(cell: Option<&[u8]>) -> Self {
        match cell {
            None => RawValue::Null,
            Some([]) => RawValue::Empty,
            Some(bytes) => RawValue::Bytes(bytes.to_vec()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::from_cell(Some(s.as_bytes()))
    }
}

/// An owned source row, one value per column in ordinal order.
pub type RawRow = Vec<RawValue>;
