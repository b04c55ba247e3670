//! Periodic progress lines on stderr.

use pq_cli_common::{format_bytes, format_number};
use pq_pipeline::PipelineStats;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Prints pipeline counters at a fixed interval while a request runs.
pub struct ProgressReporter {
    enabled: bool,
    interval: Duration,
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    pub fn new(enabled: bool, interval_secs: u64) -> Self {
        Self {
            enabled,
            interval: Duration::from_secs(interval_secs),
            stop: CancellationToken::new(),
            handle: None,
            start_time: Instant::now(),
        }
    }

    /// Start the background progress reporter.
    pub fn start(&mut self, stats: Arc<PipelineStats>) {
        if !self.enabled {
            return;
        }

        let stop = self.stop.clone();
        let interval = self.interval;
        let start_time = self.start_time;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => print_line("[Progress]", &stats, start_time.elapsed()),
                }
            }
        });

        self.handle = Some(handle);
    }

    /// Stop the reporter and print a final line.
    pub async fn stop(mut self, stats: &PipelineStats) {
        if !self.enabled {
            return;
        }

        self.stop.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }

        print_line("[Progress] Complete:", stats, self.start_time.elapsed());
    }
}

fn print_line(prefix: &str, stats: &PipelineStats, elapsed: Duration) {
    let _ = writeln!(
        io::stderr(),
        "{} {} rows read, {} records published, {} sent ({:.1}s elapsed)",
        prefix,
        format_number(stats.rows_read()),
        format_number(stats.records_published()),
        format_bytes(stats.bytes_published()),
        elapsed.as_secs_f64()
    );
}
