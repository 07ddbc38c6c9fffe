//! Core types shared by the copy pipeline:
//!
//! - [`identifier`]: identifier quoting and `schema.table` references
//! - [`value`]: raw row representation
//! - [`traits`]: source/target client traits

pub mod identifier;
pub mod traits;
pub mod value;

#[cfg(test)]
pub(crate) mod fake;

pub use identifier::{quote_ident, validate_identifier, TableRef};
pub use traits::{SourceReader, TargetWriter};
pub use value::{RawRow, RawValue};
