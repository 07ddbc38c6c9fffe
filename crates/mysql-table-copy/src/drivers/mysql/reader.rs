//! MySQL/MariaDB source reader implementation.
//!
//! Implements the `SourceReader` trait over one mysql_async session.
//! Catalog lookups use prepared statements; row extraction uses the text
//! protocol so values stay byte-exact.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Row, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::EndpointConfig;
use crate::core::identifier::TableRef;
use crate::core::traits::SourceReader;
use crate::core::value::{RawRow, RawValue};
use crate::error::{CopyError, Result};

/// Data types of the columns `SELECT *` returns, in ordinal order.
/// Invisible columns are left out of `*` expansion and of implicit
/// INSERT column lists alike.
const COLUMN_TYPES_QUERY: &str = "SELECT DATA_TYPE FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND EXTRA NOT LIKE '%INVISIBLE%' \
     ORDER BY ORDINAL_POSITION";

/// MySQL/MariaDB source reader.
pub struct MysqlReader {
    conn: Conn,
}

impl MysqlReader {
    /// Connect to the source endpoint.
    pub async fn connect(config: &EndpointConfig) -> Result<Self> {
        let conn = super::connect(config, "source").await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SourceReader for MysqlReader {
    async fn create_table_statement(&mut self, table: &TableRef) -> Result<Option<String>> {
        // SHOW CREATE TABLE also answers for views; only base tables qualify
        let exists: Option<Row> = self
            .conn
            .exec_first(
                "SELECT 1 FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND TABLE_TYPE = 'BASE TABLE'",
                (table.schema.as_str(), table.table.as_str()),
            )
            .await
            .map_err(|e| CopyError::database("looking up table", e))?;
        if exists.is_none() {
            return Ok(None);
        }

        let sql = format!("SHOW CREATE TABLE {}", table.qualified());
        let row: Option<Row> = self
            .conn
            .query_first(sql)
            .await
            .map_err(|e| CopyError::database("SHOW CREATE TABLE", e))?;

        match row.and_then(|r| r.get_opt::<String, _>(1)) {
            Some(Ok(ddl)) => Ok(Some(ddl)),
            Some(Err(e)) => Err(CopyError::database("SHOW CREATE TABLE", e)),
            None => Ok(None),
        }
    }

    async fn column_types(&mut self, table: &TableRef) -> Result<Vec<String>> {
        let rows: Vec<Row> = self
            .conn
            .exec(
                COLUMN_TYPES_QUERY,
                (table.schema.as_str(), table.table.as_str()),
            )
            .await
            .map_err(|e| CopyError::database("reading column types", e))?;

        rows.into_iter()
            .map(|row| match row.get_opt::<String, _>(0) {
                Some(Ok(data_type)) => Ok(data_type),
                Some(Err(e)) => Err(CopyError::database("reading column types", e)),
                None => Err(CopyError::Database(
                    "reading column types: DATA_TYPE missing".into(),
                )),
            })
            .collect()
    }

    async fn schema_charset(&mut self, schema: &str) -> Result<Option<String>> {
        let row: Option<Row> = self
            .conn
            .exec_first(
                "SELECT DEFAULT_CHARACTER_SET_NAME FROM information_schema.SCHEMATA \
                 WHERE SCHEMA_NAME = ?",
                (schema,),
            )
            .await
            .map_err(|e| CopyError::database("reading schema charset", e))?;

        Ok(row.and_then(|r| r.get_opt::<String, _>(0)).and_then(|v| v.ok()))
    }

    async fn stream_rows(&mut self, sql: &str, tx: mpsc::Sender<RawRow>) -> Result<u64> {
        debug!("source query: {}", sql);
        let mut result = self
            .conn
            .query_iter(sql)
            .await
            .map_err(|e| CopyError::database("source query", e))?;

        let mut sent = 0u64;
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| CopyError::database("reading rows", e))?
        {
            let raw = (0..row.len())
                .map(|i| match row.as_ref(i) {
                    None | Some(Value::NULL) => Ok(RawValue::Null),
                    Some(Value::Bytes(bytes)) => Ok(RawValue::from_cell(Some(bytes.as_slice()))),
                    // The text protocol only yields NULL or bytes
                    Some(other) => Err(CopyError::Database(format!(
                        "reading rows: unexpected binary value {:?} in column {}",
                        other, i
                    ))),
                })
                .collect::<Result<RawRow>>()?;

            if tx.send(raw).await.is_err() {
                // Receiver gone. The unread remainder stays on the wire and
                // is drained by a later disconnect.
                warn!("row consumer stopped after {} rows, abandoning source query", sent);
                break;
            }
            sent += 1;
        }

        Ok(sent)
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.conn.disconnect().await {
            debug!("source disconnect: {}", e);
        }
    }
}
