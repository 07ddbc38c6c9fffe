//! MySQL/MariaDB database driver.
//!
//! This module provides MySQL-specific implementations for:
//! - [`MysqlReader`]: Source database reader
//! - [`MysqlWriter`]: Target database writer
//!
//! Both sides use the text protocol so column values arrive as the exact
//! bytes the server renders, and go back out as SQL literals unchanged.
//!
//! # Supported Versions
//!
//! - MySQL 5.7+, 8.0+
//! - MariaDB 10.2+

mod reader;
mod writer;

pub use reader::MysqlReader;
pub use writer::MysqlWriter;

use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder};
use tracing::info;

use crate::config::{EndpointAddress, EndpointConfig};
use crate::error::{CopyError, Result};

/// Open a single session to `endpoint` and check it with `SELECT 1`.
///
/// `role` ("source" or "target") names the endpoint in errors and logs.
pub(crate) async fn connect(endpoint: &EndpointConfig, role: &str) -> Result<Conn> {
    let address = endpoint.address().ok_or_else(|| {
        CopyError::Config(format!("{}: host or socket is required", role))
    })?;
    let label = format!("{} ({})", role, address);

    let mut builder = OptsBuilder::default()
        .user(non_empty(&endpoint.user))
        .pass(non_empty(&endpoint.password))
        // Use utf8mb4 for full Unicode support
        .init(vec!["SET NAMES utf8mb4"]);

    builder = match &address {
        EndpointAddress::Socket(path) => builder.socket(Some(path.as_str())),
        EndpointAddress::Tcp { host, port } => builder
            .ip_or_hostname(host.as_str())
            .tcp_port(*port)
            .prefer_socket(Some(false)),
    };

    let mut conn = Conn::new(builder)
        .await
        .map_err(|e| CopyError::connection(&label, e))?;

    // Test connection
    conn.query_drop("SELECT 1")
        .await
        .map_err(|e| CopyError::connection(&label, e))?;

    info!("Connected to MySQL {}: {}", role, address);
    Ok(conn)
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
