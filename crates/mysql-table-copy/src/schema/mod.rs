//! Source introspection and target provisioning.
//!
//! Introspection captures everything the copy needs to know about the
//! source table before any rows move: its creation statement and the
//! column type profile that drives literal encoding. Provisioning makes the
//! target table exist in the shape of the source.

pub mod ddl;
pub mod profile;

pub use ddl::{rewrite_table_name, with_foreign_key_checks};
pub use profile::{ColumnKind, ColumnTypeProfile};

use tracing::{debug, info};

use crate::config::{CopyConfig, CopyMode};
use crate::core::identifier::TableRef;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::error::{CopyError, Result};

/// What the copy knows about the source table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: TableRef,
    /// `SHOW CREATE TABLE` text, verbatim.
    pub create_statement: String,
    pub profile: ColumnTypeProfile,
}

impl TableSchema {
    pub fn column_count(&self) -> usize {
        self.profile.len()
    }
}

/// Read the creation statement and column profile of `table`.
///
/// A missing table is a schema error, not an empty copy.
pub async fn introspect(source: &mut dyn SourceReader, table: &TableRef) -> Result<TableSchema> {
    let create_statement = source
        .create_table_statement(table)
        .await
        .map_err(|e| CopyError::schema(&format!("reading definition of {}", table), e))?
        .ok_or_else(|| CopyError::Schema(format!("source table {} does not exist", table)))?;

    let data_types = source
        .column_types(table)
        .await
        .map_err(|e| CopyError::schema(&format!("reading columns of {}", table), e))?;
    if data_types.is_empty() {
        return Err(CopyError::Schema(format!(
            "source table {} has no columns in information_schema",
            table
        )));
    }

    let profile = ColumnTypeProfile::from_data_types(&data_types);
    debug!(
        "{}: {} columns, {} escaped",
        table,
        profile.len(),
        profile
            .kinds()
            .iter()
            .filter(|k| **k == ColumnKind::Text)
            .count()
    );

    Ok(TableSchema {
        table: table.clone(),
        create_statement,
        profile,
    })
}

/// Result of [`provision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// Append modes leave the target untouched.
    Skipped,
    /// The target table was dropped (if present) and recreated.
    Recreated { schema_created: bool },
}

/// Make the target table exist in the shape of the source.
///
/// In recreate mode: create the target schema if it is missing (with the
/// source schema's default character set), then in one transaction select
/// the target schema, drop the target table if it exists, and run the
/// source creation statement with the table name replaced.
pub async fn provision(
    source: &mut dyn SourceReader,
    target: &mut dyn TargetWriter,
    schema: &TableSchema,
    target_table: &TableRef,
    copy: &CopyConfig,
) -> Result<Provisioned> {
    if copy.mode != CopyMode::Recreate {
        debug!("{} mode: leaving {} as is", copy.mode, target_table);
        return Ok(Provisioned::Skipped);
    }

    let schema_created = ensure_schema(source, target, &schema.table.schema, &target_table.schema)
        .await?;

    let create = rewrite_table_name(&schema.create_statement, &target_table.table)?;
    let statements = with_foreign_key_checks(
        copy.foreign_key_checks,
        vec![ddl::use_schema(&target_table.schema)],
        vec![ddl::drop_table(&target_table.table), create.into_bytes()],
    );
    target
        .execute_transaction(&statements)
        .await
        .map_err(|e| CopyError::schema(&format!("recreating {}", target_table), e))?;

    info!("Recreated table {}", target_table);
    Ok(Provisioned::Recreated { schema_created })
}

async fn ensure_schema(
    source: &mut dyn SourceReader,
    target: &mut dyn TargetWriter,
    source_schema: &str,
    target_schema: &str,
) -> Result<bool> {
    let exists = target
        .schema_exists(target_schema)
        .await
        .map_err(|e| CopyError::schema(&format!("checking schema {}", target_schema), e))?;
    if exists {
        return Ok(false);
    }

    let charset = source
        .schema_charset(source_schema)
        .await
        .map_err(|e| CopyError::schema(&format!("reading charset of {}", source_schema), e))?;
    target
        .execute(&ddl::create_database(target_schema, charset.as_deref()))
        .await
        .map_err(|e| CopyError::schema(&format!("creating schema {}", target_schema), e))?;

    info!(
        "Created schema {} (charset {})",
        target_schema,
        charset.as_deref().unwrap_or("server default")
    );
    Ok(true)
}
