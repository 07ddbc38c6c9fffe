//! Identifier validation and quoting for generated SQL.
//!
//! Schema and table names cannot be bound as statement parameters, so every
//! identifier that ends up in generated SQL goes through [`quote_ident`]:
//!
//! 1. Validate the identifier (no empty names, no null bytes, bounded length)
//! 2. Wrap it in backticks
//! 3. Double any embedded backticks

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CopyError, Result};

/// MySQL limits schema and table names to 64 characters.
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate an identifier for security issues.
///
/// # Errors
///
/// Returns `CopyError::Config` for empty, oversized, or null-byte identifiers.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CopyError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(CopyError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(CopyError::Config(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a MySQL identifier using backticks.
///
/// ```ignore
/// assert_eq!(quote_ident("users"), "`users`");
/// assert_eq!(quote_ident("table`name"), "`table``name`");
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// A fully-qualified `schema.table` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self> {
        let table_ref = Self {
            schema: schema.into(),
            table: table.into(),
        };
        validate_identifier(&table_ref.schema)?;
        validate_identifier(&table_ref.table)?;
        Ok(table_ref)
    }

    /// Parse `schema.table`. The first dot separates the two halves.
    pub fn parse(qualified: &str) -> Result<Self> {
        match qualified.split_once('.') {
            Some((schema, table)) if !schema.is_empty() && !table.is_empty() => {
                Self::new(schema, table)
            }
            _ => Err(CopyError::Config(format!(
                "table must be fully qualified as schema.table, got '{}'",
                qualified
            ))),
        }
    }

    /// Quoted `` `schema`.`table` `` form for use in SQL.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}
