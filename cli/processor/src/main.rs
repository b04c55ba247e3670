//! pq-processor CLI
//!
//! Republishes the rows of Parquet objects onto a message queue.

use clap::Parser;
use pq_cli_common::{format_bytes, format_number, format_rate, init_logging};
use pq_error::ErrorKind;
use std::process::ExitCode;

mod args;
mod progress;
mod run;

use args::Cli;

/// Exit code when some records of a batch were rejected by the queue.
const EXIT_PARTIAL_FAILURE: u8 = 4;

/// Exit code when the request was cancelled or ran out of time.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();

    init_logging(args.log_level, args.log_format)?;

    let outcome = run::execute(args).await?;
    let stats = &outcome.stats;

    eprintln!();
    eprintln!("Processor completed:");
    eprintln!("  Files processed:   {}", stats.files_processed);
    eprintln!("  Files failed:      {}", stats.files_failed);
    eprintln!("  Rows read:         {}", format_number(stats.rows_read));
    eprintln!(
        "  Records published: {}",
        format_number(stats.records_published)
    );
    eprintln!(
        "  Records rejected:  {}",
        format_number(stats.records_rejected)
    );
    eprintln!("  Batches:           {}", format_number(stats.batches_published));
    eprintln!("  Bytes sent:        {}", format_bytes(stats.bytes_published));
    eprintln!(
        "  Range workers:     {} launched, {} completed, {} failed, {} cancelled",
        stats.units_launched, stats.units_completed, stats.units_failed, stats.units_cancelled
    );

    if let Some(duration) = stats.duration().and_then(|d| d.to_std().ok()) {
        eprintln!("  Duration:          {:.2}s", duration.as_secs_f64());
        if stats.records_published > 0 {
            eprintln!(
                "  Throughput:        {} records",
                format_rate(stats.records_published, duration)
            );
        }
    }

    match outcome.response {
        Ok(response) => {
            println!("{}", serde_json::to_string(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("  Error:             [{}] {}", e.kind(), e);
            match e.kind() {
                ErrorKind::PartialPublishFailure => Ok(ExitCode::from(EXIT_PARTIAL_FAILURE)),
                ErrorKind::Cancelled | ErrorKind::Timeout => Ok(ExitCode::from(EXIT_CANCELLED)),
                _ => Ok(ExitCode::FAILURE),
            }
        }
    }
}
