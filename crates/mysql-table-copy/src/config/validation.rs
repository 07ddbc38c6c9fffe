//! Configuration validation.

use super::{Config, CopyMode};
use crate::core::identifier::TableRef;
use crate::error::{CopyError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.table.is_empty() {
        return Err(CopyError::Config("source.table is required".into()));
    }
    let source_table = TableRef::parse(&config.source.table)?;
    let source_addr = config.source.address().ok_or_else(|| {
        CopyError::Config("source.host or source.socket is required".into())
    })?;

    // Target validation
    let target_addr = config
        .target
        .address()
        .ok_or_else(|| CopyError::Config("target.host or target.socket is required".into()))?;
    if config.target.table.is_empty() {
        return Err(CopyError::Config("target.table is required".into()));
    }
    let target_table = TableRef::parse(&config.target.table)?;

    // Recreating the source table onto itself would drop it before reading
    if config.copy.mode == CopyMode::Recreate
        && source_addr == target_addr
        && source_table == target_table
    {
        return Err(CopyError::Config(
            "source and target cannot be the same table in recreate mode".into(),
        ));
    }

    if let Some(ref predicate) = config.copy.where_clause {
        if predicate.trim().is_empty() {
            return Err(CopyError::Config("copy.where must not be empty".into()));
        }
    }
    if config.copy.batch_bytes == 0 {
        return Err(CopyError::Config(
            "copy.batch_bytes must be at least 1".into(),
        ));
    }
    if config.copy.progress_interval == 0 {
        return Err(CopyError::Config(
            "copy.progress_interval must be at least 1".into(),
        ));
    }

    Ok(())
}
