//! Error types for the table copy library.

use thiserror::Error;

/// Process exit codes, one per error class.
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_CONFIG_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_CONNECTION_ERROR: u8 = 3;
pub const EXIT_SCHEMA_ERROR: u8 = 4;
pub const EXIT_TRANSFER_ERROR: u8 = 5;
pub const EXIT_IO_ERROR: u8 = 7;
pub const EXIT_CANCELLED: u8 = 130;

/// Main error type for copy operations.
#[derive(Error, Debug)]
pub enum CopyError {
    /// Configuration error (bad flags, invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connecting to or authenticating against an endpoint failed
    #[error("Connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// Schema introspection or DDL failed
    #[error("Schema error: {0}")]
    Schema(String),

    /// Row extraction or batch load failed
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// Error returned by the database client, before the caller has
    /// attributed it to a phase
    #[error("Database error: {0}")]
    Database(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Copy was cancelled (second SIGINT within the grace window)
    #[error("Copy cancelled")]
    Cancelled,
}

impl CopyError {
    /// Create a Connection error for the named endpoint.
    pub fn connection(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        CopyError::Connection {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Create a Schema error with context about which step failed.
    pub fn schema(context: &str, err: impl std::fmt::Display) -> Self {
        CopyError::Schema(format!("{}: {}", context, err))
    }

    /// Create a Database error with context about the statement that failed.
    pub fn database(context: &str, err: impl std::fmt::Display) -> Self {
        CopyError::Database(format!("{}: {}", context, err))
    }

    /// Create a Transfer error
    pub fn transfer(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        CopyError::Transfer {
            table: table.into(),
            message: message.to_string(),
        }
    }

    /// Exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            CopyError::Config(_) | CopyError::Yaml(_) => EXIT_CONFIG_ERROR,
            CopyError::Connection { .. } => EXIT_CONNECTION_ERROR,
            CopyError::Schema(_) => EXIT_SCHEMA_ERROR,
            CopyError::Transfer { .. } | CopyError::Database(_) | CopyError::Json(_) => {
                EXIT_TRANSFER_ERROR
            }
            CopyError::Io(_) => EXIT_IO_ERROR,
            CopyError::Cancelled => EXIT_CANCELLED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for copy operations.
pub type Result<T> = std::result::Result<T, CopyError>;
