//! Column type profile: which columns need text escaping.

use serde::{Deserialize, Serialize};

/// Literal-encoding class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Arbitrary bytes: backslashes and quotes are escaped.
    Text,
    /// Numeric or temporal text that never contains quotes or backslashes:
    /// quoted as-is.
    Opaque,
}

impl ColumnKind {
    /// Classify a catalog `DATA_TYPE`.
    ///
    /// Only numeric and temporal types are opaque. Everything else,
    /// including types this function does not recognise, is escaped.
    pub fn from_data_type(data_type: &str) -> Self {
        match data_type.trim().to_ascii_lowercase().as_str() {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "decimal"
            | "numeric" | "float" | "double" | "real" | "year" | "date" | "time" | "datetime"
            | "timestamp" => ColumnKind::Opaque,
            _ => ColumnKind::Text,
        }
    }
}

/// Per-column encoding classes, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnTypeProfile {
    kinds: Vec<ColumnKind>,
}

impl ColumnTypeProfile {
    pub fn from_data_types<S: AsRef<str>>(data_types: &[S]) -> Self {
        Self {
            kinds: data_types
                .iter()
                .map(|t| ColumnKind::from_data_type(t.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }
}

impl FromIterator<ColumnKind> for ColumnTypeProfile {
    fn from_iter<I: IntoIterator<Item = ColumnKind>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}
