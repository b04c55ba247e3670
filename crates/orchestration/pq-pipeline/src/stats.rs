//! Statistics for pipeline runs.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache line size on most modern CPUs (64 bytes).
const CACHE_LINE_SIZE: usize = 64;

/// A cache-line-padded atomic counter.
///
/// Range workers bump different counters from different tasks; padding keeps
/// each counter on its own cache line.
#[repr(C, align(64))]
#[derive(Debug)]
struct PaddedAtomicU64 {
    value: AtomicU64,
    _padding: [u8; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
}

impl Default for PaddedAtomicU64 {
    fn default() -> Self {
        Self {
            value: AtomicU64::new(0),
            _padding: [0; CACHE_LINE_SIZE - std::mem::size_of::<AtomicU64>()],
        }
    }
}

impl PaddedAtomicU64 {
    #[inline]
    fn load(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    fn add(&self, val: u64) {
        self.value.fetch_add(val, Ordering::Relaxed);
    }
}

/// Statistics collected across files, shared by every range worker.
///
/// Counters are observable progress only. After a failed file they show how
/// far the run got, which is not the same as what the queue durably holds.
#[derive(Debug)]
pub struct PipelineStats {
    started_at: DateTime<Utc>,
    completed_at: Mutex<Option<DateTime<Utc>>>,

    files_processed: PaddedAtomicU64,
    files_failed: PaddedAtomicU64,
    rows_read: PaddedAtomicU64,
    batches_published: PaddedAtomicU64,
    records_published: PaddedAtomicU64,
    records_rejected: PaddedAtomicU64,
    bytes_published: PaddedAtomicU64,
    units_launched: PaddedAtomicU64,
    units_completed: PaddedAtomicU64,
    units_failed: PaddedAtomicU64,
    units_cancelled: PaddedAtomicU64,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            completed_at: Mutex::new(None),
            files_processed: PaddedAtomicU64::default(),
            files_failed: PaddedAtomicU64::default(),
            rows_read: PaddedAtomicU64::default(),
            batches_published: PaddedAtomicU64::default(),
            records_published: PaddedAtomicU64::default(),
            records_rejected: PaddedAtomicU64::default(),
            bytes_published: PaddedAtomicU64::default(),
            units_launched: PaddedAtomicU64::default(),
            units_completed: PaddedAtomicU64::default(),
            units_failed: PaddedAtomicU64::default(),
            units_cancelled: PaddedAtomicU64::default(),
        }
    }

    /// Mark processing as complete with the current time.
    pub fn complete(&self) {
        *self.completed_at.lock() = Some(Utc::now());
    }

    /// Record a file whose every row was published.
    pub fn record_file_success(&self) {
        self.files_processed.add(1);
    }

    /// Record a failed file.
    pub fn record_file_failure(&self) {
        self.files_failed.add(1);
    }

    /// Record rows read from a source.
    pub fn record_rows_read(&self, rows: u64) {
        self.rows_read.add(rows);
    }

    /// Record one publish call and its per-record outcome.
    pub fn record_publish(&self, succeeded: u64, rejected: u64, bytes: u64) {
        self.batches_published.add(1);
        self.records_published.add(succeeded);
        self.records_rejected.add(rejected);
        self.bytes_published.add(bytes);
    }

    /// Record a work unit being launched.
    pub fn record_unit_launched(&self) {
        self.units_launched.add(1);
    }

    /// Record a work unit finishing without error.
    pub fn record_unit_completed(&self) {
        self.units_completed.add(1);
    }

    /// Record a work unit failing.
    pub fn record_unit_failed(&self) {
        self.units_failed.add(1);
    }

    /// Record a work unit stopping because of cancellation.
    pub fn record_unit_cancelled(&self) {
        self.units_cancelled.add(1);
    }

    pub fn files_processed(&self) -> u64 {
        self.files_processed.load()
    }

    pub fn files_failed(&self) -> u64 {
        self.files_failed.load()
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read.load()
    }

    pub fn batches_published(&self) -> u64 {
        self.batches_published.load()
    }

    pub fn records_published(&self) -> u64 {
        self.records_published.load()
    }

    pub fn records_rejected(&self) -> u64 {
        self.records_rejected.load()
    }

    pub fn bytes_published(&self) -> u64 {
        self.bytes_published.load()
    }

    /// Get the total duration (up to now if not yet complete).
    pub fn duration(&self) -> Duration {
        let end = (*self.completed_at.lock()).unwrap_or_else(Utc::now);
        end - self.started_at
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            completed_at: *self.completed_at.lock(),
            files_processed: self.files_processed(),
            files_failed: self.files_failed(),
            rows_read: self.rows_read(),
            batches_published: self.batches_published(),
            records_published: self.records_published(),
            records_rejected: self.records_rejected(),
            bytes_published: self.bytes_published(),
            units_launched: self.units_launched.load(),
            units_completed: self.units_completed.load(),
            units_failed: self.units_failed.load(),
            units_cancelled: self.units_cancelled.load(),
        }
    }
}

/// A serializable snapshot of pipeline statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub files_processed: u64,
    pub files_failed: u64,
    pub rows_read: u64,
    pub batches_published: u64,
    pub records_published: u64,
    pub records_rejected: u64,
    pub bytes_published: u64,
    pub units_launched: u64,
    pub units_completed: u64,
    pub units_failed: u64,
    pub units_cancelled: u64,
}

impl StatsSnapshot {
    /// Duration between start and completion, if completed.
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }

    /// Duration in seconds, if completed.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration().map(|d| d.num_milliseconds() as f64 / 1000.0)
    }

    /// Published records per second, if completed.
    pub fn records_per_second(&self) -> Option<f64> {
        self.duration_secs().map(|secs| {
            if secs > 0.0 {
                self.records_published as f64 / secs
            } else {
                0.0
            }
        })
    }
}
