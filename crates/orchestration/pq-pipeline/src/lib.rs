//! pq-pipeline - Parallel partition-and-publish pipeline for parquet-queue.
//!
//! A file's rows are split into fixed-size ranges, each range is read by
//! its own worker, re-chunked into queue-sized batches and published. The
//! [`Coordinator`] bounds how many workers run at once and stops the whole
//! file at the first failure.
//!
//! # Example
//!
//! ```ignore
//! use pq_pipeline::{FileProcessor, PipelineConfig, PipelineStats};
//! use pq_publisher::StatsPublisher;
//! use pq_source_parquet::ParquetSource;
//!
//! let config = PipelineConfig::new().with_rows_per_worker(2_500);
//! let processor = FileProcessor::new(
//!     Arc::new(ParquetSource::default()),
//!     Arc::new(StatsPublisher::new()),
//!     config,
//!     Arc::new(PipelineStats::new()),
//! );
//!
//! let report = processor.process_file(path, &CancellationToken::new()).await?;
//! eprintln!("Published {} rows in {} batches", report.rows, report.batches);
//! ```

pub mod batcher;
pub mod config;
pub mod coordinator;
pub mod handler;
pub mod partition;
pub mod processor;
pub mod range_worker;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use batcher::{batch_count, chunk};
pub use config::PipelineConfig;
pub use coordinator::{
    Coordinator, Deadline, ErrorCollector, PipelineResult, RunReport, UnitContext, WorkUnit,
};
pub use handler::RequestHandler;
pub use partition::partition;
pub use processor::{FileProcessor, FileReport};
pub use range_worker::RangeWorker;
pub use stats::{PipelineStats, StatsSnapshot};
