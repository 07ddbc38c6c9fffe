//! # mysql-table-copy
//!
//! Copy one MySQL/MariaDB table to another server, schema, or table name.
//!
//! The copy is a streaming pipeline:
//!
//! - **Introspection**: the source `CREATE TABLE` statement and a column
//!   type profile deciding which values need escaping
//! - **Provisioning**: in recreate mode, the target schema is created if
//!   missing and the target table is dropped and recreated
//! - **Transfer**: a producer task streams rows through a capacity-1 channel
//!   to a consumer that commits byte-bounded multi-row `INSERT` batches
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_table_copy::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> mysql_table_copy::Result<()> {
//!     let config = Config::load("copy.yaml")?.finalize()?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run().await?;
//!     println!("{} rows inserted", result.rows_inserted);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod interrupt;
pub mod orchestrator;
pub mod schema;
pub mod transfer;

// Re-exports for convenient access
pub use config::{Config, CopyConfig, CopyMode, EndpointConfig, ForeignKeyChecks};
pub use crate::core::{RawRow, RawValue, SourceReader, TableRef, TargetWriter};
pub use error::{CopyError, Result};
pub use interrupt::{InterruptContext, SignalAction};
pub use orchestrator::{CopyResult, Orchestrator};
pub use transfer::{TransferEngine, TransferJob, TransferStats};
