//! Database driver implementations.
//!
//! - [`mysql`]: MySQL/MariaDB source reader and target writer
//!
//! Drivers implement the [`SourceReader`](crate::core::SourceReader) and
//! [`TargetWriter`](crate::core::TargetWriter) traits; everything above this
//! module is database-agnostic and tested against in-memory fakes.

pub mod mysql;

pub use mysql::{MysqlReader, MysqlWriter};
