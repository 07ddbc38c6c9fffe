//! Client traits at the database seam.
//!
//! The copy pipeline treats each endpoint as an opaque client that executes
//! SQL text and returns rows:
//!
//! - [`SourceReader`]: catalog lookups and row streaming on the source
//! - [`TargetWriter`]: statement and transaction execution on the target
//!
//! The MySQL implementations live in `drivers::mysql`; tests drive the
//! pipeline with in-memory fakes.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

use super::identifier::TableRef;
use super::value::RawRow;

/// Read schema metadata and rows from a source database.
#[async_trait]
pub trait SourceReader: Send {
    /// Full `CREATE TABLE` text for a table, or `None` if it does not exist.
    async fn create_table_statement(&mut self, table: &TableRef) -> Result<Option<String>>;

    /// Catalog data types (`information_schema.COLUMNS.DATA_TYPE`) in
    /// ordinal order. Empty if the table does not exist.
    async fn column_types(&mut self, table: &TableRef) -> Result<Vec<String>>;

    /// Default character set of a schema, if the schema exists.
    async fn schema_charset(&mut self, schema: &str) -> Result<Option<String>>;

    /// Run `sql` and send every row, in result order, into `tx`.
    ///
    /// Each row is owned by the receiver once sent. Waits for channel
    /// capacity before fetching the next row. Returns the number of rows
    /// sent; stops early without error if the receiver is dropped.
    async fn stream_rows(&mut self, sql: &str, tx: mpsc::Sender<RawRow>) -> Result<u64>;

    /// Close the underlying connection.
    async fn close(self: Box<Self>);
}

/// Execute statements against a target database.
#[async_trait]
pub trait TargetWriter: Send {
    /// Check whether a schema (database) exists.
    async fn schema_exists(&mut self, schema: &str) -> Result<bool>;

    /// Execute one statement outside an explicit transaction.
    async fn execute(&mut self, sql: &[u8]) -> Result<()>;

    /// Execute statements in order inside one transaction and commit.
    ///
    /// If any statement fails the transaction is abandoned and the error
    /// returned; nothing from this call is committed.
    async fn execute_transaction(&mut self, statements: &[Vec<u8>]) -> Result<()>;

    /// Close the underlying connection.
    async fn close(self: Box<Self>);
}
