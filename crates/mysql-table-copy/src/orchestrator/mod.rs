//! Copy orchestrator - main workflow coordinator.
//!
//! Runs the phases of one table copy in order: introspect the source table,
//! provision the target, stream the rows, release both sessions.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, CopyMode};
use crate::core::traits::{SourceReader, TargetWriter};
use crate::drivers::{MysqlReader, MysqlWriter};
use crate::error::Result;
use crate::schema::{self, Provisioned};
use crate::transfer::{TransferEngine, TransferJob};

/// Copy orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Box<dyn SourceReader>,
    target: Box<dyn TargetWriter>,
}

/// Result of a copy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyResult {
    /// Unique run identifier.
    pub run_id: String,

    pub source_table: String,
    pub target_table: String,
    pub mode: CopyMode,

    /// The target schema did not exist and was created.
    pub schema_created: bool,

    /// The target table was dropped and recreated.
    pub table_recreated: bool,

    /// Rows committed to the target.
    pub rows_inserted: u64,

    /// Committed batch transactions.
    pub batches: u64,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Average throughput (rows/second).
    pub rows_per_second: u64,
}

impl CopyResult {
    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Orchestrator {
    /// Connect to both endpoints described by a finalized configuration.
    pub async fn new(config: Config) -> Result<Self> {
        let source = MysqlReader::connect(&config.source).await?;
        let target = match MysqlWriter::connect(&config.target).await {
            Ok(target) => target,
            Err(e) => {
                Box::new(source).close().await;
                return Err(e);
            }
        };
        Ok(Self::with_endpoints(config, Box::new(source), Box::new(target)))
    }

    /// Build an orchestrator over already-connected endpoints.
    pub fn with_endpoints(
        config: Config,
        source: Box<dyn SourceReader>,
        target: Box<dyn TargetWriter>,
    ) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    /// Run the copy. Both sessions are released on return, success or not;
    /// after a failed batch the source session is dropped rather than closed.
    pub async fn run(self) -> Result<CopyResult> {
        let Self {
            config,
            mut source,
            mut target,
        } = self;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        info!("Starting copy run {}", run_id);

        let prepared = prepare(&config, &mut *source, &mut *target).await;
        let (job, provisioned) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                source.close().await;
                target.close().await;
                return Err(e);
            }
        };

        // The source session moves into the producer and is closed there
        let transferred = TransferEngine::new(&config.copy)
            .execute(source, &mut *target, &job)
            .await;
        target.close().await;
        let stats = transferred?;

        let duration = start.elapsed();
        let secs = duration.as_secs_f64();
        let result = CopyResult {
            run_id,
            source_table: job.source_table.to_string(),
            target_table: job.target_table.to_string(),
            mode: config.copy.mode,
            schema_created: matches!(
                provisioned,
                Provisioned::Recreated {
                    schema_created: true
                }
            ),
            table_recreated: provisioned != Provisioned::Skipped,
            rows_inserted: stats.rows,
            batches: stats.batches,
            duration_seconds: secs,
            started_at,
            completed_at: Utc::now(),
            rows_per_second: if secs > 0.0 {
                (stats.rows as f64 / secs) as u64
            } else {
                0
            },
        };

        info!(
            "Copy complete: {} rows into {} in {:.2}s",
            result.rows_inserted, result.target_table, result.duration_seconds
        );
        Ok(result)
    }
}

/// Introspect the source table and provision the target.
async fn prepare(
    config: &Config,
    source: &mut dyn SourceReader,
    target: &mut dyn TargetWriter,
) -> Result<(TransferJob, Provisioned)> {
    let source_table = config.source_table()?;
    let target_table = config.target_table()?;

    let table_schema = schema::introspect(source, &source_table).await?;
    let provisioned =
        schema::provision(source, target, &table_schema, &target_table, &config.copy).await?;

    let job = TransferJob {
        source_table,
        target_table,
        where_clause: config.copy.where_clause.clone(),
        profile: table_schema.profile,
    };
    Ok((job, provisioned))
}
