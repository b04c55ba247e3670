//! Queue publishers for parquet-queue.
//!
//! - [`SqsPublisher`] - `SendMessageBatch` with one entry per record
//! - [`StdoutPublisher`] - JSON lines on stdout, for debugging
//! - [`StatsPublisher`] - Counts records without sending them

mod sqs;
mod stats;
mod stdout;

pub use sqs::{SqsConfig, SqsPublisher};
pub use stats::{StatsPublisher, StatsReport};
pub use stdout::{OutputFormat, StdoutPublisher};
