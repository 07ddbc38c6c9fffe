//! Streaming row transfer from source to target.
//!
//! One producer task reads rows from the source and hands each one, as an
//! owned copy, through a capacity-1 channel. The consumer renders rows into
//! a byte-bounded multi-row INSERT and commits a transaction each time the
//! statement outgrows the threshold, then flushes the remainder once the
//! stream ends. Rows are loaded in source order.

pub mod batch;
pub mod encode;

pub use batch::{BatchBuilder, DEFAULT_BATCH_BYTES};
pub use encode::LiteralEncoder;

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CopyConfig;
use crate::core::identifier::TableRef;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::core::value::RawRow;
use crate::error::{CopyError, Result};
use crate::schema::{ddl, with_foreign_key_checks, ColumnTypeProfile};

/// At most one row waits in the channel while the consumer encodes another.
const ROW_CHANNEL_CAPACITY: usize = 1;

/// Bytes of a failing statement echoed at debug level.
const FAILED_STATEMENT_PREVIEW: usize = 1024;

/// What to copy and where.
#[derive(Debug, Clone)]
pub struct TransferJob {
    pub source_table: TableRef,
    pub target_table: TableRef,
    /// Predicate appended as `WHERE <predicate>`.
    pub where_clause: Option<String>,
    pub profile: ColumnTypeProfile,
}

impl TransferJob {
    /// The extraction query.
    pub fn select_statement(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.source_table.qualified());
        if let Some(predicate) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        sql
    }
}

/// Statistics from a transfer.
#[derive(Debug, Clone, Default)]
pub struct TransferStats {
    /// Rows committed to the target.
    pub rows: u64,
    /// Committed batch transactions.
    pub batches: u64,
    /// Total INSERT statement bytes sent.
    pub bytes: u64,
    pub duration: Duration,
}

impl TransferStats {
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.rows as f64 / secs
        } else {
            0.0
        }
    }
}

/// Transfer engine for one table.
pub struct TransferEngine {
    config: CopyConfig,
}

impl TransferEngine {
    pub fn new(config: &CopyConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Stream every selected source row into the target table.
    ///
    /// The source is moved into the producer task and closed there once
    /// extraction ends. A failed batch aborts the producer instead, so the
    /// error surfaces without waiting on the source. On error, batches
    /// committed before the failure stay in the target.
    pub async fn execute(
        &self,
        source: Box<dyn SourceReader>,
        target: &mut dyn TargetWriter,
        job: &TransferJob,
    ) -> Result<TransferStats> {
        info!(
            "Starting transfer {} -> {} (mode: {})",
            job.source_table, job.target_table, self.config.mode
        );
        let start = Instant::now();

        let (tx, mut rx) = mpsc::channel::<RawRow>(ROW_CHANNEL_CAPACITY);
        let producer = tokio::spawn(extract(source, job.select_statement(), tx));

        let encoder = LiteralEncoder::new(job.profile.clone());
        let mut batch = BatchBuilder::new(&job.target_table, self.config.mode, self.config.batch_bytes);
        let mut stats = TransferStats::default();

        let consumed = self
            .consume(&mut rx, target, job, &encoder, &mut batch, &mut stats)
            .await;

        if let Err(e) = consumed {
            // A graceful close would first read the rest of the open result
            // set, so the source session is dropped with the aborted task
            producer.abort();
            if let Err(join) = producer.await {
                if !join.is_cancelled() {
                    warn!("{}: reader task failed during abort: {}", job.source_table, join);
                }
            }
            return Err(e);
        }
        let extracted = join_producer(producer, job).await?;

        // End of stream only counts once the producer finished cleanly
        if !batch.is_empty() {
            self.flush(target, job, &mut batch, &mut stats).await?;
        }
        debug_assert_eq!(extracted, stats.rows);

        stats.duration = start.elapsed();
        info!(
            "{}: transferred {} rows in {:?} ({:.0} rows/sec, {} batches)",
            job.target_table,
            stats.rows,
            stats.duration,
            stats.rows_per_second(),
            stats.batches
        );
        Ok(stats)
    }

    /// Receive rows until the producer hangs up, committing full batches.
    async fn consume(
        &self,
        rx: &mut mpsc::Receiver<RawRow>,
        target: &mut dyn TargetWriter,
        job: &TransferJob,
        encoder: &LiteralEncoder,
        batch: &mut BatchBuilder,
        stats: &mut TransferStats,
    ) -> Result<()> {
        let mut received = 0u64;
        while let Some(row) = rx.recv().await {
            received += 1;
            if row.len() != encoder.arity() {
                return Err(CopyError::transfer(
                    job.source_table.to_string(),
                    format!(
                        "row {} has {} columns, expected {}",
                        received,
                        row.len(),
                        encoder.arity()
                    ),
                ));
            }

            batch.push_row(encoder, &row);
            if batch.is_full() {
                self.flush(target, job, batch, stats).await?;
            }

            if received % self.config.progress_interval == 0 {
                info!("{}: {} rows read", job.source_table, received);
            }
        }
        Ok(())
    }

    /// Commit the buffered statement in its own transaction and reset.
    async fn flush(
        &self,
        target: &mut dyn TargetWriter,
        job: &TransferJob,
        batch: &mut BatchBuilder,
        stats: &mut TransferStats,
    ) -> Result<()> {
        let setup = if self.config.select_schema {
            vec![ddl::use_schema(&job.target_table.schema)]
        } else {
            Vec::new()
        };
        let statements = with_foreign_key_checks(
            self.config.foreign_key_checks,
            setup,
            vec![batch.statement().to_vec()],
        );

        if let Err(e) = target.execute_transaction(&statements).await {
            let stmt = batch.statement();
            debug!(
                "failing statement ({} bytes): {}",
                stmt.len(),
                String::from_utf8_lossy(&stmt[..stmt.len().min(FAILED_STATEMENT_PREVIEW)])
            );
            return Err(CopyError::transfer(
                job.target_table.to_string(),
                format!("batch of {} rows rejected: {}", batch.rows(), e),
            ));
        }

        stats.rows += batch.rows() as u64;
        stats.batches += 1;
        stats.bytes += batch.len() as u64;
        debug!(
            "{}: committed batch {} ({} rows, {} bytes, {} total rows)",
            job.target_table,
            stats.batches,
            batch.rows(),
            batch.len(),
            stats.rows
        );
        batch.reset();
        Ok(())
    }
}

/// Producer: run the extraction query, then release the source session.
async fn extract(
    mut source: Box<dyn SourceReader>,
    sql: String,
    tx: mpsc::Sender<RawRow>,
) -> Result<u64> {
    let result = source.stream_rows(&sql, tx).await;
    source.close().await;
    result
}

async fn join_producer(producer: JoinHandle<Result<u64>>, job: &TransferJob) -> Result<u64> {
    match producer.await {
        Ok(Ok(rows)) => {
            debug!("{}: no more rows to read ({} extracted)", job.source_table, rows);
            Ok(rows)
        }
        Ok(Err(e)) => Err(CopyError::transfer(job.source_table.to_string(), e)),
        Err(e) => Err(CopyError::transfer(
            job.source_table.to_string(),
            format!("Reader task panicked: {}", e),
        )),
    }
}
