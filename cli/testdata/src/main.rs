//! pq-testdata CLI
//!
//! Generates synthetic customer records as Parquet for load tests.

use clap::Parser;
use pq_cli_common::{LogFormat, format_bytes, format_number, format_rate, init_logging};
use std::io::{self, Write};

mod args;
mod generate;

use args::Cli;
use generate::{GenerateOptions, StopAt};

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    init_logging(args.log_level, LogFormat::Text)?;

    let options = GenerateOptions {
        stop_at: match args.rows {
            Some(rows) => StopAt::Rows(rows),
            None => StopAt::Bytes(args.target_bytes),
        },
        flush_rows: args.flush_rows,
        body_length: args.body_length,
        seed: args.seed,
    };

    let summary = generate::write_file(&args.output, &options, |rows, bytes| {
        let _ = write!(
            io::stderr(),
            "\rGenerated {} rows, {}",
            format_number(rows),
            format_bytes(bytes)
        );
    })?;

    eprintln!();
    eprintln!("Generation completed:");
    eprintln!("  Output:     {}", args.output.display());
    eprintln!("  Rows:       {}", format_number(summary.rows));
    eprintln!("  Row groups: {}", summary.row_groups);
    eprintln!("  File size:  {}", format_bytes(summary.bytes));
    eprintln!("  Duration:   {:.2}s", summary.duration.as_secs_f64());
    eprintln!(
        "  Throughput: {} rows",
        format_rate(summary.rows, summary.duration)
    );

    Ok(())
}
