//! Stdout publisher.

use async_trait::async_trait;
use pq_error::{PqError, PublishError, Result};
use pq_traits::{PublishReport, Publisher};
use pq_types::Batch;
use std::io::{self, Write};
use std::time::Instant;

/// Output format for the stdout publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    Jsonl,
    /// Pretty-printed JSON
    Json,
}

/// Publisher that writes every record to stdout.
///
/// Used for debugging and pipeline verification. A whole batch is written
/// under one stdout lock so records of concurrent batches never interleave
/// mid-line.
pub struct StdoutPublisher {
    format: OutputFormat,
}

impl StdoutPublisher {
    /// Create a new stdout publisher.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Create a stdout publisher with JSONL format.
    pub fn jsonl() -> Self {
        Self::new(OutputFormat::Jsonl)
    }

    /// Create a stdout publisher with pretty JSON format.
    pub fn json() -> Self {
        Self::new(OutputFormat::Json)
    }

    fn render(&self, batch: &Batch) -> Result<(Vec<String>, String)> {
        let mut ids = Vec::with_capacity(batch.len());
        let mut out = String::new();

        for (i, record) in batch.records().iter().enumerate() {
            let line = match self.format {
                OutputFormat::Jsonl => record.to_body(),
                OutputFormat::Json => serde_json::to_string_pretty(record.value()),
            }
            .map_err(|e| {
                PqError::Publish(PublishError::Encoding {
                    record: i,
                    message: e.to_string(),
                })
            })?;
            out.push_str(&line);
            out.push('\n');
            ids.push(format!("msg-{}", i));
        }

        Ok((ids, out))
    }
}

impl Default for StdoutPublisher {
    fn default() -> Self {
        Self::jsonl()
    }
}

#[async_trait]
impl Publisher for StdoutPublisher {
    async fn publish_batch(&self, batch: &Batch) -> Result<PublishReport> {
        let start = Instant::now();
        let (ids, out) = self.render(batch)?;

        let mut stdout = io::stdout().lock();
        stdout
            .write_all(out.as_bytes())
            .map_err(|e| PqError::Publish(PublishError::Transport(format!("stdout: {}", e))))?;

        Ok(PublishReport::success(batch.index(), ids, out.len() as u64)
            .with_duration(start.elapsed()))
    }

    async fn flush(&self) -> Result<()> {
        io::stdout()
            .flush()
            .map_err(|e| PqError::Publish(PublishError::Transport(format!("stdout: {}", e))))
    }
}
