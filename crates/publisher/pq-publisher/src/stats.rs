//! Stats publisher.

use async_trait::async_trait;
use pq_error::{PqError, PublishError, Result};
use pq_traits::{PublishReport, Publisher};
use pq_types::Batch;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Publisher that counts records and bytes without sending anything.
///
/// Used for dry runs and throughput measurement.
pub struct StatsPublisher {
    records: AtomicU64,
    bytes: AtomicU64,
    batches: AtomicU64,
}

impl StatsPublisher {
    /// Create a new stats publisher.
    pub fn new() -> Self {
        Self {
            records: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            batches: AtomicU64::new(0),
        }
    }

    /// Get the current statistics.
    pub fn get_stats(&self) -> StatsReport {
        StatsReport {
            records: self.records.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.records.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        self.batches.store(0, Ordering::Relaxed);
    }
}

impl Default for StatsPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics report from the stats publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsReport {
    /// Total records counted
    pub records: u64,
    /// Total message body bytes
    pub bytes: u64,
    /// Total batches counted
    pub batches: u64,
}

#[async_trait]
impl Publisher for StatsPublisher {
    async fn publish_batch(&self, batch: &Batch) -> Result<PublishReport> {
        let start = Instant::now();
        let mut ids = Vec::with_capacity(batch.len());
        let mut bytes = 0u64;

        for (i, record) in batch.records().iter().enumerate() {
            let body = record.to_body().map_err(|e| {
                PqError::Publish(PublishError::Encoding {
                    record: i,
                    message: e.to_string(),
                })
            })?;
            bytes += body.len() as u64;
            ids.push(format!("msg-{}", i));
        }

        self.records.fetch_add(ids.len() as u64, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.batches.fetch_add(1, Ordering::Relaxed);

        Ok(PublishReport::success(batch.index(), ids, bytes).with_duration(start.elapsed()))
    }
}
