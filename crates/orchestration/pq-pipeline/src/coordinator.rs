//! Concurrent execution of work units with fail-fast cancellation.
//!
//! The [`Coordinator`] keeps at most `concurrency` units in flight on a
//! [`JoinSet`]. The first failure cancels a token shared by every unit and
//! stops new launches; units still running are drained and their results
//! discarded. Results come back to the coordinator through the join set, so
//! no unit ever blocks on reporting an error.
//!
//! Cancellation is cooperative. Units call [`UnitContext::checkpoint`] before
//! each blocking call, and a call already past its checkpoint runs to
//! completion.

use async_trait::async_trait;
use pq_error::{PqError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::stats::PipelineStats;

/// An overall deadline with the budget it was created from.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// Returns true once the deadline has passed.
    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// The budget this deadline was created with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    fn error(&self) -> PqError {
        PqError::DeadlineExceeded(self.budget)
    }
}

/// Per-unit view of the shared stop signals.
#[derive(Debug, Clone)]
pub struct UnitContext {
    cancel: CancellationToken,
    deadline: Option<Deadline>,
}

impl UnitContext {
    /// Create a context from a cancellation token and optional deadline.
    pub fn new(cancel: CancellationToken, deadline: Option<Deadline>) -> Self {
        Self { cancel, deadline }
    }

    /// Fails if the run was cancelled or the deadline passed.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(PqError::Cancelled("run cancelled".to_string()));
        }
        if let Some(deadline) = &self.deadline {
            if deadline.expired() {
                return Err(deadline.error());
            }
        }
        Ok(())
    }

    /// Returns true if the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// One independently schedulable piece of work.
#[async_trait]
pub trait WorkUnit: Send + Sync + 'static {
    /// Short description used in logs.
    fn describe(&self) -> String;

    /// Runs the unit, returning the number of rows it processed.
    async fn run(&self, ctx: &UnitContext) -> Result<u64>;
}

/// Terminal state of one file.
#[derive(Debug)]
pub enum PipelineResult {
    /// Every unit finished without error
    Completed { rows_processed: u64 },

    /// The first observed error
    Failed { cause: PqError },
}

impl PipelineResult {
    /// Returns true if the run completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineResult::Completed { .. })
    }

    /// Converts into a `Result` carrying the processed row count.
    pub fn into_result(self) -> Result<u64> {
        match self {
            PipelineResult::Completed { rows_processed } => Ok(rows_processed),
            PipelineResult::Failed { cause } => Err(cause),
        }
    }
}

/// Outcome of a coordinator run.
#[derive(Debug)]
pub struct RunReport {
    /// Terminal state
    pub result: PipelineResult,

    /// Additional errors kept after the cause, up to `error_capacity - 1`
    pub suppressed: Vec<PqError>,

    /// Units handed to the run
    pub units_total: usize,

    /// Units actually started
    pub units_launched: usize,

    /// Units that finished without error
    pub units_completed: usize,

    /// Units that stopped on the shared cancellation after the cause
    pub units_cancelled: usize,

    /// Rows processed by units that finished without error, including
    /// those of a failed run
    pub rows_processed: u64,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

/// Bounded collector of run errors.
///
/// The first error recorded is the cause. Later errors are kept as
/// diagnostics until `capacity` errors are held, then dropped.
#[derive(Debug)]
pub struct ErrorCollector {
    capacity: usize,
    cause: Option<PqError>,
    suppressed: Vec<PqError>,
    dropped: usize,
}

impl ErrorCollector {
    /// Create a collector keeping at most `capacity` errors (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            cause: None,
            suppressed: Vec::new(),
            dropped: 0,
        }
    }

    /// Records an error. Returns true if it became the cause.
    pub fn record(&mut self, error: PqError) -> bool {
        if self.cause.is_none() {
            self.cause = Some(error);
            return true;
        }
        if 1 + self.suppressed.len() < self.capacity {
            self.suppressed.push(error);
        } else {
            self.dropped += 1;
        }
        false
    }

    fn record_logged(&mut self, error: PqError) -> bool {
        let kind = error.kind();
        let message = error.to_string();
        let is_cause = self.record(error);
        if is_cause {
            warn!(kind = %kind, error = %message, "Unit failed, cancelling remaining units");
        } else {
            warn!(kind = %kind, error = %message, "Additional unit failure");
        }
        is_cause
    }

    /// Returns true if no error was recorded.
    pub fn is_empty(&self) -> bool {
        self.cause.is_none()
    }

    /// Number of errors that did not fit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Splits into the cause and the retained extra errors.
    pub fn into_parts(self) -> (Option<PqError>, Vec<PqError>) {
        (self.cause, self.suppressed)
    }
}

/// Drives work units to completion with a concurrency ceiling.
#[derive(Debug, Clone)]
pub struct Coordinator {
    concurrency: usize,
    error_capacity: usize,
    stats: Option<Arc<PipelineStats>>,
}

impl Coordinator {
    /// Create a coordinator running at most `concurrency` units at once.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            error_capacity: 1,
            stats: None,
        }
    }

    /// Keep up to `capacity` errors per run.
    pub fn with_error_capacity(mut self, capacity: usize) -> Self {
        self.error_capacity = capacity.max(1);
        self
    }

    /// Record unit lifecycle counters into `stats`.
    pub fn with_stats(mut self, stats: Arc<PipelineStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Runs every unit, stopping at the first error.
    ///
    /// The run's token is a child of `parent`: cancelling the parent stops
    /// the run, while a failure inside the run never cancels the parent.
    pub async fn run<U>(
        &self,
        units: Vec<U>,
        parent: &CancellationToken,
        deadline: Option<Deadline>,
    ) -> RunReport
    where
        U: WorkUnit,
    {
        let start = Instant::now();
        let units_total = units.len();
        let cancel = parent.child_token();
        let mut pending = units.into_iter();
        let mut join_set: JoinSet<Result<u64>> = JoinSet::new();
        let mut errors = ErrorCollector::new(self.error_capacity);

        let mut units_launched = 0usize;
        let mut units_completed = 0usize;
        let mut units_cancelled = 0usize;
        let mut rows_processed = 0u64;
        let mut deadline_hit = false;

        debug!(
            units = units_total,
            concurrency = self.concurrency,
            "Starting coordinator run"
        );

        loop {
            while join_set.len() < self.concurrency && !cancel.is_cancelled() {
                let Some(unit) = pending.next() else {
                    break;
                };

                if let Some(d) = deadline.filter(|d| d.expired()) {
                    deadline_hit = true;
                    if errors.is_empty() {
                        warn!(budget = ?d.budget(), "Deadline passed before all units started");
                        errors.record(d.error());
                    }
                    cancel.cancel();
                    break;
                }

                let ctx = UnitContext::new(cancel.clone(), deadline);
                units_launched += 1;
                if let Some(stats) = &self.stats {
                    stats.record_unit_launched();
                }
                debug!(unit = %unit.describe(), "Launching unit");
                join_set.spawn(async move { unit.run(&ctx).await });
            }

            if join_set.is_empty() {
                break;
            }

            let joined = match deadline.filter(|_| !deadline_hit) {
                Some(d) => {
                    let wake = tokio::time::Instant::now() + d.remaining();
                    tokio::select! {
                        joined = join_set.join_next() => joined,
                        _ = tokio::time::sleep_until(wake) => {
                            deadline_hit = true;
                            if errors.is_empty() {
                                warn!(budget = ?d.budget(), "Deadline exceeded, cancelling remaining units");
                                errors.record(d.error());
                            }
                            cancel.cancel();
                            continue;
                        }
                    }
                }
                None => join_set.join_next().await,
            };

            let Some(joined) = joined else {
                break;
            };

            let outcome = joined.map_err(|e| {
                if e.is_panic() {
                    PqError::Task(format!("unit panicked: {}", e))
                } else {
                    PqError::Task(format!("unit aborted: {}", e))
                }
            });

            match outcome.and_then(|r| r) {
                Ok(rows) => {
                    units_completed += 1;
                    rows_processed += rows;
                    if let Some(stats) = &self.stats {
                        stats.record_unit_completed();
                    }
                }
                Err(e) if !errors.is_empty() && is_stop_consequence(&e) => {
                    units_cancelled += 1;
                    if let Some(stats) = &self.stats {
                        stats.record_unit_cancelled();
                    }
                    debug!(error = %e, "Unit stopped after cancellation");
                }
                Err(e) => {
                    if let Some(stats) = &self.stats {
                        if e.is_cancellation() {
                            stats.record_unit_cancelled();
                        } else {
                            stats.record_unit_failed();
                        }
                    }
                    if errors.record_logged(e) {
                        cancel.cancel();
                    }
                }
            }
        }

        if errors.is_empty() && units_launched < units_total {
            errors.record(PqError::Cancelled(format!(
                "run cancelled with {} of {} units started",
                units_launched, units_total
            )));
        }

        if errors.dropped() > 0 {
            debug!(dropped = errors.dropped(), "Errors beyond capacity dropped");
        }

        let (cause, suppressed) = errors.into_parts();
        let result = match cause {
            None => PipelineResult::Completed { rows_processed },
            Some(cause) => PipelineResult::Failed { cause },
        };

        let report = RunReport {
            result,
            suppressed,
            units_total,
            units_launched,
            units_completed,
            units_cancelled,
            rows_processed,
            duration: start.elapsed(),
        };

        info!(
            units = report.units_total,
            launched = report.units_launched,
            completed = report.units_completed,
            cancelled = report.units_cancelled,
            rows = report.rows_processed,
            success = report.result.is_completed(),
            "Coordinator run finished"
        );

        report
    }
}

/// Errors that only report the shared stop signal rather than a fault.
fn is_stop_consequence(error: &PqError) -> bool {
    matches!(
        error,
        PqError::Cancelled(_) | PqError::DeadlineExceeded(_)
    )
}
