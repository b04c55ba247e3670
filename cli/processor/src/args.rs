//! CLI argument definitions for pq-processor.

use clap::{Args, Parser, ValueEnum};
use pq_pipeline::PipelineConfig;
use std::path::PathBuf;
use std::time::Duration;

pub use pq_cli_common::{LogFormat, LogLevel};

/// Republishes every row of one or more Parquet objects onto a message queue.
///
/// A request names a bucket and an ordered list of object keys. Each object is
/// downloaded to a temporary directory, split into row ranges that are read and
/// published concurrently, and deleted afterwards.
///
/// ## Examples
///
/// Publish two objects to SQS:
///   pq-processor -b my-bucket -p in/a.parquet -p in/b.parquet --queue-url https://sqs...
///
/// Read the request from stdin and count records without sending them:
///   echo '{"bucket":"b","paths":["a.parquet"]}' | pq-processor --request - -d stats
///
/// Run against a local directory laid out as <root>/<bucket>/<key>:
///   pq-processor --local-root ./data -b my-bucket -p a.parquet -d stdout
#[derive(Parser, Debug)]
#[command(name = "pq-processor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Request ===
    /// JSON request file ({"bucket": ..., "paths": [...]}), or "-" for stdin
    #[arg(long, conflicts_with_all = ["bucket", "paths"])]
    pub request: Option<String>,

    /// Bucket holding the objects
    #[arg(short = 'b', long, required_unless_present = "request")]
    pub bucket: Option<String>,

    /// Object key to process (repeatable, processed in order)
    #[arg(short = 'p', long = "path", required_unless_present = "request")]
    pub paths: Vec<String>,

    /// Fetch objects from <root>/<bucket>/<key> instead of S3
    #[arg(long, env = "PQ_LOCAL_ROOT")]
    pub local_root: Option<PathBuf>,

    /// Directory for per-request temporary files
    #[arg(long, env = "PQ_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    // === Destination ===
    /// Output destination type
    #[arg(short = 'd', long, value_enum, default_value = "sqs")]
    pub destination: DestinationType,

    /// Output format for stdout destination
    #[arg(long, value_enum, default_value = "jsonl")]
    pub output_format: OutputFormat,

    /// SQS queue URL (required when destination=sqs)
    #[arg(long, env = "QUEUE_URL")]
    pub queue_url: Option<String>,

    /// Custom SQS endpoint URL (for LocalStack)
    #[arg(long, env = "PQ_SQS_ENDPOINT")]
    pub sqs_endpoint: Option<String>,

    /// Entries per SendMessageBatch call (1-10)
    #[arg(long, env = "SQS_BATCH_SIZE", default_value = "10", value_parser = parse_batch_size)]
    pub sqs_batch_size: usize,

    // === Pipeline ===
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    // === AWS Configuration ===
    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "S3_ENDPOINT_OVERRIDE")]
    pub s3_endpoint: Option<String>,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    // === Progress Options ===
    /// Enable progress reporting to stderr
    #[arg(long)]
    pub progress: bool,

    /// Progress reporting interval in seconds
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub progress_interval: u64,

    // === Logging ===
    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log line format
    #[arg(long, value_enum, env = "PQ_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

/// Partitioning and concurrency knobs.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Rows read by each range worker
    #[arg(long, env = "ROWS_PER_WORKER", default_value = "10000", value_parser = parse_positive_u64)]
    pub rows_per_worker: u64,

    /// Records per published batch (1-10)
    #[arg(long, env = "ROWS_PER_BATCH", default_value = "10", value_parser = parse_batch_size)]
    pub rows_per_batch: usize,

    /// Rows decoded per Parquet read step
    #[arg(long, env = "PQ_READ_BATCH_SIZE", default_value = "1000", value_parser = parse_positive_usize)]
    pub read_batch_size: usize,

    /// Range workers running at once
    #[arg(short = 'c', long, env = "PQ_MAX_CONCURRENCY", default_value = "16", value_parser = parse_positive_usize)]
    pub max_concurrency: usize,

    /// Batches each range worker publishes at once
    #[arg(long, env = "PQ_PUBLISH_CONCURRENCY", default_value = "1", value_parser = parse_positive_usize)]
    pub publish_concurrency: usize,

    /// Overall request deadline in seconds
    #[arg(long, env = "PQ_DEADLINE_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub deadline_secs: Option<u64>,

    /// Failures kept for diagnostics (the first is always the one reported)
    #[arg(long, env = "PQ_ERROR_CAPACITY", default_value = "1", value_parser = parse_positive_usize)]
    pub error_capacity: usize,
}

impl PipelineArgs {
    /// Build the pipeline configuration.
    pub fn to_config(&self) -> PipelineConfig {
        let config = PipelineConfig::new()
            .with_rows_per_worker(self.rows_per_worker)
            .with_max_batch_size(self.rows_per_batch)
            .with_read_batch_size(self.read_batch_size)
            .with_max_concurrency(self.max_concurrency)
            .with_publish_concurrency(self.publish_concurrency)
            .with_error_capacity(self.error_capacity);

        match self.deadline_secs {
            Some(secs) => config.with_deadline(Duration::from_secs(secs)),
            None => config,
        }
    }
}

/// Destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DestinationType {
    /// Publish to an SQS queue
    Sqs,
    /// Output to stdout as JSON/JSONL
    Stdout,
    /// Count records without output (dry runs)
    Stats,
}

/// Output format for stdout destination.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    Jsonl,
    /// Pretty-printed JSON
    Json,
}

impl From<OutputFormat> for pq_publisher::OutputFormat {
    fn from(arg: OutputFormat) -> Self {
        match arg {
            OutputFormat::Jsonl => pq_publisher::OutputFormat::Jsonl,
            OutputFormat::Json => pq_publisher::OutputFormat::Json,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

fn parse_positive_u64(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

/// Parse a batch size (1-10, the SQS per-call limit).
fn parse_batch_size(s: &str) -> Result<usize, String> {
    let value = parse_positive_usize(s)?;
    if value > pq_types::MAX_BATCH_SIZE {
        return Err(format!("{} is not in 1..={}", value, pq_types::MAX_BATCH_SIZE));
    }
    Ok(value)
}
