//! Range workers: read one row range, batch it, publish every batch.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use pq_error::{PqError, Result, SourceError};
use pq_traits::{Publisher, RowReader};
use pq_types::{Batch, Record, RowRange};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::batcher::chunk;
use crate::coordinator::{UnitContext, WorkUnit};
use crate::stats::PipelineStats;

/// Executes one row range of a file.
///
/// The reader handle is shared with every other range worker of the file and
/// is only ever used for independent range queries.
pub struct RangeWorker {
    range: RowRange,
    reader: Arc<dyn RowReader>,
    publisher: Arc<dyn Publisher>,
    max_batch_size: usize,
    publish_concurrency: usize,
    stats: Arc<PipelineStats>,
}

impl RangeWorker {
    /// Create a worker for `range` publishing batches of `max_batch_size`.
    pub fn new(
        range: RowRange,
        reader: Arc<dyn RowReader>,
        publisher: Arc<dyn Publisher>,
        max_batch_size: usize,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            range,
            reader,
            publisher,
            max_batch_size,
            publish_concurrency: 1,
            stats,
        }
    }

    /// Publish up to `concurrency` batches of this range at once.
    pub fn with_publish_concurrency(mut self, concurrency: usize) -> Self {
        self.publish_concurrency = concurrency.max(1);
        self
    }

    /// The range this worker owns.
    pub fn range(&self) -> RowRange {
        self.range
    }

    /// Reads exactly the rows of this range, in row order.
    ///
    /// No retries: any read failure is terminal for the range.
    pub async fn read_rows(&self) -> Result<Vec<Record>> {
        let records = self.reader.read_range(self.range).await?;

        let actual = records.len() as u64;
        if actual != self.range.len() {
            return Err(PqError::Source(SourceError::ShortRead {
                expected: self.range.len(),
                actual,
            }));
        }

        self.stats.record_rows_read(actual);
        Ok(records)
    }

    async fn publish(&self, batch: Batch, ctx: &UnitContext) -> Result<u64> {
        ctx.checkpoint()?;

        let report = self.publisher.publish_batch(&batch).await?;
        self.stats.record_publish(
            report.success_count(),
            report.failed_count(),
            report.bytes_sent,
        );

        trace!(
            file = self.reader.location(),
            range = %self.range,
            batch_index = batch.index(),
            records = batch.len(),
            "Published batch"
        );

        report.into_result()
    }
}

#[async_trait]
impl WorkUnit for RangeWorker {
    fn describe(&self) -> String {
        format!("{} {}", self.reader.location(), self.range)
    }

    async fn run(&self, ctx: &UnitContext) -> Result<u64> {
        ctx.checkpoint()?;

        debug!(file = self.reader.location(), range = %self.range, "Reading range");
        let records = self.read_rows().await?;
        let rows = records.len() as u64;

        let batches = chunk(records, self.max_batch_size);
        let batch_count = batches.len();

        if self.publish_concurrency <= 1 {
            for batch in batches {
                self.publish(batch, ctx).await?;
            }
        } else {
            stream::iter(batches)
                .map(|batch| self.publish(batch, ctx))
                .buffer_unordered(self.publish_concurrency)
                .try_for_each(|_| async { Ok(()) })
                .await?;
        }

        debug!(
            file = self.reader.location(),
            range = %self.range,
            rows = rows,
            batches = batch_count,
            "Range published"
        );

        Ok(rows)
    }
}
