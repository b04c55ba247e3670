//! CLI argument definitions for pq-testdata.

use clap::Parser;
use std::path::PathBuf;

pub use pq_cli_common::{LogFormat, LogLevel};

/// Default target file size (1 GiB).
const DEFAULT_TARGET_BYTES: u64 = 1024 * 1024 * 1024;

/// Writes a Parquet file of synthetic customer records.
///
/// Generation stops once `--rows` rows are written or, without `--rows`,
/// once the file reaches `--target-bytes`.
///
/// ## Examples
///
/// A 1 GiB file in the current directory:
///   pq-testdata
///
/// Exactly 10,000 reproducible rows:
///   pq-testdata -o small.parquet --rows 10000 --seed 42
#[derive(Parser, Debug)]
#[command(name = "pq-testdata")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output file
    #[arg(short = 'o', long, default_value = "test_data.parquet")]
    pub output: PathBuf,

    /// Stop after this many rows
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub rows: Option<u64>,

    /// Stop once the file reaches this many bytes (ignored with --rows)
    #[arg(long, default_value_t = DEFAULT_TARGET_BYTES)]
    pub target_bytes: u64,

    /// Rows buffered between flushes (one row group each)
    #[arg(long, default_value = "10000", value_parser = clap::value_parser!(u64).range(1..))]
    pub flush_rows: u64,

    /// Length of the random `body` text in each row
    #[arg(long, default_value = "1000")]
    pub body_length: usize,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}
