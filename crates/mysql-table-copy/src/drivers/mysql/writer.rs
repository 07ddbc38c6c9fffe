//! MySQL/MariaDB target writer implementation.
//!
//! Implements the `TargetWriter` trait over one mysql_async session.
//! Statements are sent as raw bytes through the text protocol; literal
//! escaping has already been applied by the caller.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Row, TxOpts};
use tracing::debug;

use crate::config::EndpointConfig;
use crate::core::traits::TargetWriter;
use crate::error::{CopyError, Result};

/// MySQL/MariaDB target writer.
pub struct MysqlWriter {
    conn: Conn,
}

impl MysqlWriter {
    /// Connect to the target endpoint.
    pub async fn connect(config: &EndpointConfig) -> Result<Self> {
        let conn = super::connect(config, "target").await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl TargetWriter for MysqlWriter {
    async fn schema_exists(&mut self, schema: &str) -> Result<bool> {
        let row: Option<Row> = self
            .conn
            .exec_first(
                "SELECT 1 FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
                (schema,),
            )
            .await
            .map_err(|e| CopyError::database("checking schema", e))?;
        Ok(row.is_some())
    }

    async fn execute(&mut self, sql: &[u8]) -> Result<()> {
        self.conn
            .query_drop(sql)
            .await
            .map_err(|e| CopyError::database("execute", e))
    }

    async fn execute_transaction(&mut self, statements: &[Vec<u8>]) -> Result<()> {
        let mut tx = self
            .conn
            .start_transaction(TxOpts::default())
            .await
            .map_err(|e| CopyError::database("starting transaction", e))?;

        for stmt in statements {
            if let Err(e) = tx.query_drop(stmt.as_slice()).await {
                if let Err(rb) = tx.rollback().await {
                    debug!("rollback after failed statement: {}", rb);
                }
                return Err(CopyError::database("transaction", e));
            }
        }

        tx.commit()
            .await
            .map_err(|e| CopyError::database("commit", e))
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.conn.disconnect().await {
            debug!("target disconnect: {}", e);
        }
    }
}
