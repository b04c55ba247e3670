//! Configuration types for the pipeline.

use pq_types::MAX_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of rows assigned to one range worker.
pub const DEFAULT_ROWS_PER_WORKER: u64 = 10_000;

/// Default number of range workers running at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rows per range worker
    pub rows_per_worker: u64,

    /// Rows decoded per read step within a range
    pub read_batch_size: usize,

    /// Records per publish call (at most 10)
    pub max_batch_size: usize,

    /// Range workers running at once
    pub max_concurrency: usize,

    /// Concurrent publish calls within one range worker
    pub publish_concurrency: usize,

    /// Overall deadline for one request
    #[serde(default, with = "optional_secs")]
    pub deadline: Option<Duration>,

    /// Errors retained per file for diagnostics (the first is the cause)
    pub error_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rows_per_worker: DEFAULT_ROWS_PER_WORKER,
            read_batch_size: 1_000,
            max_batch_size: MAX_BATCH_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            publish_concurrency: 1,
            deadline: None,
            error_capacity: 1,
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rows per range worker.
    pub fn with_rows_per_worker(mut self, rows: u64) -> Self {
        self.rows_per_worker = rows;
        self
    }

    /// Set the rows decoded per read step.
    pub fn with_read_batch_size(mut self, size: usize) -> Self {
        self.read_batch_size = size;
        self
    }

    /// Set the records per publish call.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Set the range worker concurrency ceiling.
    pub fn with_max_concurrency(mut self, concurrency: usize) -> Self {
        self.max_concurrency = concurrency;
        self
    }

    /// Set the concurrent publish calls per range worker.
    pub fn with_publish_concurrency(mut self, concurrency: usize) -> Self {
        self.publish_concurrency = concurrency;
        self
    }

    /// Set the overall request deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set how many errors are retained per file.
    pub fn with_error_capacity(mut self, capacity: usize) -> Self {
        self.error_capacity = capacity;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.rows_per_worker == 0 {
            return Err("rows_per_worker must be at least 1".to_string());
        }
        if self.read_batch_size == 0 {
            return Err("read_batch_size must be at least 1".to_string());
        }
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE {
            return Err(format!(
                "max_batch_size must be between 1 and {}",
                MAX_BATCH_SIZE
            ));
        }
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be at least 1".to_string());
        }
        if self.publish_concurrency == 0 {
            return Err("publish_concurrency must be at least 1".to_string());
        }
        if self.error_capacity == 0 {
            return Err("error_capacity must be at least 1".to_string());
        }
        if self.deadline == Some(Duration::ZERO) {
            return Err("deadline must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Serde helper for optional whole-second durations.
mod optional_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}
