//! Common utilities for integration tests.

pub mod fixtures;
pub mod localstack;

pub use fixtures::{CollectingPublisher, LocalBucket, parquet_bytes};
pub use localstack::LocalStackTestContext;
