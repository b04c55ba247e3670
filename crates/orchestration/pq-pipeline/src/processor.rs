//! Per-file pipeline: open, count, partition, fan out, report.

use pq_error::{PqError, Result};
use pq_traits::{Publisher, RowSource};
use pq_types::MAX_BATCH_SIZE;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::batcher::batch_count;
use crate::config::PipelineConfig;
use crate::coordinator::{Coordinator, Deadline, PipelineResult, RunReport};
use crate::partition::partition;
use crate::range_worker::RangeWorker;
use crate::stats::PipelineStats;

/// Summary of one fully published file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Rows published
    pub rows: u64,

    /// Row ranges the file was split into
    pub ranges: usize,

    /// Batches the file was split into
    pub batches: u64,

    /// Time from open to last publish
    pub duration: Duration,
}

/// Republishes every row of one local file.
pub struct FileProcessor {
    source: Arc<dyn RowSource>,
    publisher: Arc<dyn Publisher>,
    config: PipelineConfig,
    stats: Arc<PipelineStats>,
}

impl FileProcessor {
    /// Create a processor. The configuration must already be validated.
    pub fn new(
        source: Arc<dyn RowSource>,
        publisher: Arc<dyn Publisher>,
        config: PipelineConfig,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            source,
            publisher,
            config,
            stats,
        }
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Shared statistics.
    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    fn max_batch_size(&self) -> usize {
        self.config
            .max_batch_size
            .min(self.publisher.max_batch_size())
            .clamp(1, MAX_BATCH_SIZE)
    }

    /// Processes a file under the configured deadline.
    pub async fn process_file(&self, path: &Path, cancel: &CancellationToken) -> Result<FileReport> {
        let deadline = self.config.deadline.map(Deadline::after);
        self.process_file_until(path, cancel, deadline).await
    }

    /// Processes a file under an externally owned deadline.
    pub async fn process_file_until(
        &self,
        path: &Path,
        cancel: &CancellationToken,
        deadline: Option<Deadline>,
    ) -> Result<FileReport> {
        let start = Instant::now();
        let file = path.display().to_string();

        let (report, ranges, batches) = match self.run(path, cancel, deadline).await {
            Ok(run) => run,
            Err(e) => {
                self.stats.record_file_failure();
                error!(file = %file, kind = %e.kind(), error = %e, "File failed before publishing");
                return Err(e);
            }
        };

        for (i, extra) in report.suppressed.iter().enumerate() {
            warn!(file = %file, n = i + 1, kind = %extra.kind(), error = %extra, "Suppressed unit failure");
        }

        match report.result {
            PipelineResult::Completed { rows_processed } => {
                self.stats.record_file_success();
                let file_report = FileReport {
                    rows: rows_processed,
                    ranges,
                    batches,
                    duration: start.elapsed(),
                };
                info!(
                    file = %file,
                    rows = file_report.rows,
                    ranges = file_report.ranges,
                    batches = file_report.batches,
                    duration_ms = file_report.duration.as_millis() as u64,
                    "File published"
                );
                Ok(file_report)
            }
            PipelineResult::Failed { cause } => {
                self.stats.record_file_failure();
                error!(
                    file = %file,
                    kind = %cause.kind(),
                    error = %cause,
                    rows_before_failure = report.rows_processed,
                    suppressed = report.suppressed.len(),
                    "File failed"
                );
                Err(cause)
            }
        }
    }

    /// Runs the pipeline for one file and returns the coordinator's report
    /// together with the range and batch counts.
    ///
    /// Configuration, open and count failures return `Err` directly since
    /// no unit ran.
    pub async fn run(
        &self,
        path: &Path,
        cancel: &CancellationToken,
        deadline: Option<Deadline>,
    ) -> Result<(RunReport, usize, u64)> {
        self.config.validate().map_err(PqError::Config)?;

        if cancel.is_cancelled() {
            return Err(PqError::Cancelled("cancelled before opening file".to_string()));
        }

        let reader = self.source.open(path).await?;
        let total_rows = reader.count().await?;

        let ranges = partition(total_rows, self.config.rows_per_worker);
        let max_batch_size = self.max_batch_size();
        let batches: u64 = ranges
            .iter()
            .map(|r| batch_count(r.len(), max_batch_size))
            .sum();

        info!(
            file = reader.location(),
            rows = total_rows,
            ranges = ranges.len(),
            batches = batches,
            "Partitioned file"
        );

        let workers: Vec<RangeWorker> = ranges
            .iter()
            .map(|&range| {
                RangeWorker::new(
                    range,
                    Arc::clone(&reader),
                    Arc::clone(&self.publisher),
                    max_batch_size,
                    Arc::clone(&self.stats),
                )
                .with_publish_concurrency(self.config.publish_concurrency)
            })
            .collect();

        let report = Coordinator::new(self.config.max_concurrency)
            .with_error_capacity(self.config.error_capacity)
            .with_stats(Arc::clone(&self.stats))
            .run(workers, cancel, deadline)
            .await;

        if let Err(e) = self.publisher.flush().await {
            if report.result.is_completed() {
                return Err(e);
            }
            warn!(error = %e, "Publisher flush failed after run failure");
        }

        Ok((report, ranges.len(), batches))
    }
}
