//! Shared utilities for parquet-queue CLI binaries.
//!
//! This crate provides common functionality shared between the
//! `pq-processor` and `pq-testdata` CLI applications.

pub mod args;
pub mod format;
pub mod logging;

pub use args::{LogFormat, LogLevel};
pub use format::{format_bytes, format_duration, format_number, format_rate};
pub use logging::init_logging;
