//! Configuration type definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::transfer::DEFAULT_BATCH_BYTES;

/// Socket used when the source has neither host nor socket configured.
pub const DEFAULT_SOCKET: &str = "/var/lib/mysql/mysql.sock";

/// Default MySQL TCP port.
pub const DEFAULT_PORT: u16 = 3306;

/// Rows between verbose progress markers.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source endpoint and table.
    #[serde(default)]
    pub source: EndpointConfig,

    /// Target endpoint and table.
    #[serde(default)]
    pub target: EndpointConfig,

    /// Copy behavior.
    #[serde(default)]
    pub copy: CopyConfig,
}

/// One database endpoint plus the table addressed on it.
#[derive(Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Database host (ignored when `socket` is set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Database port (default: 3306).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Local socket path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,

    /// Fully-qualified table, `schema.table`.
    #[serde(default)]
    pub table: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            host: None,
            port: DEFAULT_PORT,
            socket: None,
            table: String::new(),
        }
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("socket", &self.socket)
            .field("table", &self.table)
            .finish()
    }
}

/// How to reach an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointAddress {
    Socket(String),
    Tcp { host: String, port: u16 },
}

impl EndpointConfig {
    /// The socket wins over host:port when both are set.
    pub fn address(&self) -> Option<EndpointAddress> {
        match (&self.socket, &self.host) {
            (Some(socket), _) if !socket.is_empty() => Some(EndpointAddress::Socket(socket.clone())),
            (_, Some(host)) if !host.is_empty() => Some(EndpointAddress::Tcp {
                host: host.clone(),
                port: self.port,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointAddress::Socket(path) => write!(f, "unix:{}", path),
            EndpointAddress::Tcp { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

/// Copy behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Target handling (default: recreate).
    #[serde(default)]
    pub mode: CopyMode,

    /// Row filter appended to the source query as `WHERE <predicate>`.
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,

    /// Foreign key check suspension scope (default: transaction).
    #[serde(default)]
    pub foreign_key_checks: ForeignKeyChecks,

    /// Flush a batch once its statement exceeds this many bytes.
    #[serde(default = "default_batch_bytes")]
    pub batch_bytes: usize,

    /// Issue `USE <target schema>` at the start of every batch transaction.
    #[serde(default)]
    pub select_schema: bool,

    /// Rows between progress log lines.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            mode: CopyMode::default(),
            where_clause: None,
            foreign_key_checks: ForeignKeyChecks::default(),
            batch_bytes: DEFAULT_BATCH_BYTES,
            select_schema: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Target table handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyMode {
    /// Drop and recreate the target table from the source DDL.
    #[default]
    Recreate,

    /// Insert into the existing target table.
    Append,

    /// Insert into the existing target table, skipping duplicate-key rows.
    AppendIgnore,
}

impl CopyMode {
    pub fn is_append(self) -> bool {
        !matches!(self, CopyMode::Recreate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CopyMode::Recreate => "recreate",
            CopyMode::Append => "append",
            CopyMode::AppendIgnore => "append-ignore",
        }
    }
}

impl fmt::Display for CopyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CopyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recreate" | "drop_recreate" | "replace" => Ok(CopyMode::Recreate),
            "append" | "insert" => Ok(CopyMode::Append),
            "append-ignore" | "append_ignore" | "ignore" | "insert-ignore" => {
                Ok(CopyMode::AppendIgnore)
            }
            other => Err(format!(
                "unknown copy mode '{}'. Supported: recreate, append, append-ignore",
                other
            )),
        }
    }
}

/// Where `foreign_key_checks` is suspended on the target.
///
/// - `Enabled`: never touched.
/// - `Transaction`: disabled as the first statement of every DDL and batch
///   transaction and re-enabled before commit.
/// - `Statement`: the disable/re-enable pair wraps each statement inside
///   the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyChecks {
    Enabled,
    #[default]
    Transaction,
    Statement,
}

impl FromStr for ForeignKeyChecks {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enabled" | "on" | "keep" => Ok(ForeignKeyChecks::Enabled),
            "transaction" | "tx" => Ok(ForeignKeyChecks::Transaction),
            "statement" | "stmt" => Ok(ForeignKeyChecks::Statement),
            other => Err(format!(
                "unknown foreign key check scope '{}'. Supported: enabled, transaction, statement",
                other
            )),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_batch_bytes() -> usize {
    DEFAULT_BATCH_BYTES
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}
