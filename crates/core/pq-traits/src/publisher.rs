//! Publisher trait and related types.

use async_trait::async_trait;
use pq_error::{PqError, PublishError, RejectedRecord, Result};
use pq_types::{Batch, MAX_BATCH_SIZE};
use std::time::Duration;

/// Trait for batch publishers.
///
/// A publisher accepts one [`Batch`] per call and reports the outcome of
/// every record in it. The two failure shapes are kept apart:
///
/// - `Err(PublishError::Transport)` / `Err(PublishError::Encoding)`: the call
///   as a whole failed, nothing can be assumed about its records
/// - `Ok(report)` with rejected records: the call went through but the queue
///   refused some entries; [`PublishReport::into_result`] turns that into
///   `PublishError::PartialFailure`
///
/// Publishing is not idempotent. Replaying a batch after a partial failure
/// can deliver its accepted records twice.
///
/// # Implementations
///
/// - SQS publisher: `SendMessageBatch`, up to 10 entries per call
/// - Stdout publisher: JSON lines for debugging
/// - Stats publisher: counts records without sending them
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes one batch.
    async fn publish_batch(&self, batch: &Batch) -> Result<PublishReport>;

    /// Largest batch this publisher accepts in one call.
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    /// Flushes any buffered output.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Per-record outcome of one publish call.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    /// Index of the published batch
    pub batch_index: u32,

    /// Entry ids accepted by the queue
    pub succeeded: Vec<String>,

    /// Entries rejected by the queue
    pub rejected: Vec<RejectedRecord>,

    /// Bytes of message bodies sent
    pub bytes_sent: u64,

    /// Time taken by the call
    pub duration: Duration,
}

impl PublishReport {
    /// Creates a report where every entry succeeded.
    pub fn success(batch_index: u32, succeeded: Vec<String>, bytes_sent: u64) -> Self {
        Self {
            batch_index,
            succeeded,
            rejected: Vec::new(),
            bytes_sent,
            duration: Duration::ZERO,
        }
    }

    /// Sets the rejected entries.
    pub fn with_rejected(mut self, rejected: Vec<RejectedRecord>) -> Self {
        self.rejected = rejected;
        self
    }

    /// Sets the call duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Number of accepted records.
    pub fn success_count(&self) -> u64 {
        self.succeeded.len() as u64
    }

    /// Number of rejected records.
    pub fn failed_count(&self) -> u64 {
        self.rejected.len() as u64
    }

    /// Returns true if every record was accepted.
    pub fn is_complete_success(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Converts a report with rejections into a partial publish failure.
    ///
    /// Returns the accepted record count on full success.
    pub fn into_result(self) -> Result<u64> {
        if self.rejected.is_empty() {
            return Ok(self.success_count());
        }
        Err(PqError::Publish(PublishError::PartialFailure {
            succeeded: self.success_count(),
            failed: self.failed_count(),
            rejected: self.rejected,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pq_error::ErrorKind;
    use pq_types::Record;

    fn rejected(id: &str) -> RejectedRecord {
        RejectedRecord {
            id: id.to_string(),
            code: "InternalError".to_string(),
            message: None,
        }
    }

    #[test]
    fn test_full_success_report() {
        let ids: Vec<String> = (0..10).map(|i| format!("msg-{i}")).collect();
        let report = PublishReport::success(0, ids, 512);

        assert!(report.is_complete_success());
        assert_eq!(report.into_result().unwrap(), 10);
    }

    #[test]
    fn test_partial_report_surfaces_partial_failure() {
        let ids: Vec<String> = (0..8).map(|i| format!("msg-{i}")).collect();
        let report =
            PublishReport::success(3, ids, 512).with_rejected(vec![rejected("msg-8"), rejected("msg-9")]);

        assert_eq!(report.success_count(), 8);
        assert_eq!(report.failed_count(), 2);

        let err = report.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialPublishFailure);
        match err {
            PqError::Publish(PublishError::PartialFailure {
                succeeded,
                failed,
                rejected,
            }) => {
                assert_eq!(succeeded, 8);
                assert_eq!(failed, 2);
                assert_eq!(rejected.len(), 2);
            }
            e => panic!("Expected PartialFailure, got: {:?}", e),
        }
    }

    struct NoopPublisher;

    #[async_trait]
    impl Publisher for NoopPublisher {
        async fn publish_batch(&self, batch: &Batch) -> Result<PublishReport> {
            let ids = (0..batch.len()).map(|i| i.to_string()).collect();
            Ok(PublishReport::success(batch.index(), ids, 0))
        }
    }

    #[tokio::test]
    async fn test_publisher_defaults() {
        let publisher = NoopPublisher;
        assert_eq!(publisher.max_batch_size(), MAX_BATCH_SIZE);
        assert!(publisher.flush().await.is_ok());

        let batch = Batch::new(0, vec![Record::new(serde_json::json!({"id": 1}))]);
        let report = publisher.publish_batch(&batch).await.unwrap();
        assert_eq!(report.success_count(), 1);
    }
}
