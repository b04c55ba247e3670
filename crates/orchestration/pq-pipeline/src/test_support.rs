//! In-memory sources and publishers for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use pq_error::{PqError, PublishError, RejectedRecord, Result, SourceError};
use pq_traits::{PublishReport, Publisher, RowReader, RowSource};
use pq_types::{Batch, MAX_BATCH_SIZE, Record, RowRange};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Rows `{"id": i}` for `i` in `0..rows`. Returns fewer rows than asked when
/// a range runs past the end.
pub struct MemoryReader {
    rows: u64,
    fail_at: Option<u64>,
    reads: AtomicUsize,
}

impl MemoryReader {
    pub fn new(rows: u64) -> Self {
        Self {
            rows,
            fail_at: None,
            reads: AtomicUsize::new(0),
        }
    }

    /// Fail any range read that contains `row`.
    pub fn failing_at(mut self, row: u64) -> Self {
        self.fail_at = Some(row);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RowReader for MemoryReader {
    fn location(&self) -> &str {
        "memory"
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows)
    }

    async fn read_range(&self, range: RowRange) -> Result<Vec<Record>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if let Some(row) = self.fail_at {
            if range.contains(row) {
                return Err(PqError::Source(SourceError::Query(format!(
                    "injected failure at row {}",
                    row
                ))));
            }
        }

        Ok((range.start..range.end.min(self.rows))
            .map(|i| Record::new(json!({ "id": i })))
            .collect())
    }
}

/// Source handing out readers by file name.
#[derive(Default)]
pub struct MemorySource {
    files: Mutex<HashMap<String, Arc<MemoryReader>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, name: &str, reader: MemoryReader) -> Self {
        self.files.lock().insert(name.to_string(), Arc::new(reader));
        self
    }
}

#[async_trait]
impl RowSource for MemorySource {
    async fn open(&self, path: &Path) -> Result<Arc<dyn RowReader>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let reader = self.files.lock().get(&name).cloned();
        match reader {
            Some(reader) => Ok(reader),
            None => Err(PqError::Source(SourceError::Unavailable(name))),
        }
    }
}

/// Accepts everything and remembers the ids of every batch.
pub struct RecordingPublisher {
    batches: Mutex<Vec<Vec<u64>>>,
    max_batch_size: usize,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Report `size` as the largest batch this publisher accepts.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.batches.lock().iter().flatten().copied().collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish_batch(&self, batch: &Batch) -> Result<PublishReport> {
        tokio::task::yield_now().await;
        let ids: Vec<u64> = batch
            .records()
            .iter()
            .filter_map(|r| r.value()["id"].as_u64())
            .collect();
        let entry_ids = (0..batch.len()).map(|i| format!("msg-{i}")).collect();
        self.batches.lock().push(ids);
        Ok(PublishReport::success(batch.index(), entry_ids, 0))
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fails every publish call, either wholesale or by rejecting records.
pub struct FailingPublisher {
    rejected: Option<usize>,
    calls: AtomicUsize,
}

impl FailingPublisher {
    /// Accept the call but reject the last `rejected` records of each batch.
    pub fn partial(rejected: usize) -> Self {
        Self {
            rejected: Some(rejected),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the call itself.
    pub fn transport() -> Self {
        Self {
            rejected: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish_batch(&self, batch: &Batch) -> Result<PublishReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(rejected) = self.rejected else {
            return Err(PqError::Publish(PublishError::Transport(
                "connection reset".to_string(),
            )));
        };

        let accepted = batch.len().saturating_sub(rejected);
        let succeeded = (0..accepted).map(|i| format!("msg-{i}")).collect();
        let failed = (accepted..batch.len())
            .map(|i| RejectedRecord {
                id: format!("msg-{i}"),
                code: "InternalError".to_string(),
                message: None,
            })
            .collect();

        Ok(PublishReport::success(batch.index(), succeeded, 0).with_rejected(failed))
    }
}
