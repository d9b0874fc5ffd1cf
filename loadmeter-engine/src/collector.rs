use loadmeter_common::{Outcome, Result, SuccessPolicy};
use parking_lot::Mutex;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::error;

use crate::export;
use crate::report::Report;

/// Samples recorded under the lock together with their counters, so a
/// snapshot never sees a sample whose counter has not been bumped yet.
#[derive(Default)]
struct SampleLog {
    latencies_ms: Vec<u64>,
}

/// Thread-safe sink for operation outcomes.
///
/// Each collector is independent; use one per logical endpoint or scenario.
/// Share it between workers behind an `Arc`.
pub struct MetricsCollector {
    name: String,
    log: Mutex<SampleLog>,
    success_count: AtomicU64,
    error_count: AtomicU64,
    active: AtomicI64,
}

impl MetricsCollector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: Mutex::new(SampleLog::default()),
            success_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            active: AtomicI64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append the elapsed time and bump exactly one of the success/error counters.
    pub fn record(&self, outcome: Outcome) {
        let counter = if outcome.success { &self.success_count } else { &self.error_count };
        let mut log = self.log.lock();
        log.latencies_ms.push(outcome.elapsed_ms);
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, elapsed_ms: u64) {
        self.record(Outcome::success(elapsed_ms));
    }

    pub fn record_error(&self, elapsed_ms: u64) {
        self.record(Outcome::error(elapsed_ms));
    }

    /// Record a response by status code, classified with `policy`.
    pub fn record_status(&self, elapsed: Duration, status: u16, policy: SuccessPolicy) {
        self.record(Outcome::from_status(elapsed, status, policy));
    }

    pub fn increment_active(&self) {
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active(&self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn active_requests(&self) -> i64 {
        self.active.load(Ordering::Relaxed)
    }

    /// Increment the active gauge until the returned guard is dropped.
    pub fn track_active(&self) -> ActiveGuard<'_> {
        self.increment_active();
        ActiveGuard { collector: self }
    }

    /// Run `op`, timing it and recording `Ok` as a success and `Err` as an error.
    /// The active gauge covers the whole call.
    pub async fn time<F, T, E>(&self, op: F) -> std::result::Result<T, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
    {
        let _active = self.track_active();
        let start = Instant::now();
        let result = op.await;
        self.record(Outcome::from_elapsed(start.elapsed(), result.is_ok()));
        result
    }

    /// Snapshot without throughput.
    pub fn report(&self) -> Report {
        self.snapshot(None)
    }

    /// Snapshot with throughput computed over the caller's wall-clock run time.
    pub fn report_with_elapsed(&self, elapsed: Duration) -> Report {
        self.snapshot(Some(elapsed))
    }

    fn snapshot(&self, elapsed: Option<Duration>) -> Report {
        let (samples, success, errors) = {
            let log = self.log.lock();
            (
                log.latencies_ms.clone(),
                self.success_count.load(Ordering::Relaxed),
                self.error_count.load(Ordering::Relaxed),
            )
        };
        Report::from_samples(&self.name, samples, success, errors, self.active_requests(), elapsed)
    }

    /// Append the current report to a CSV file. Failures are logged, not returned.
    pub fn export_csv(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if let Err(e) = self.try_export_csv(path) {
            error!(collector = %self.name, path = %path.display(), error = %e, "metrics export failed");
        }
    }

    pub fn try_export_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        export::append_report(path.as_ref(), &self.report())
    }

    pub fn print_report(&self) {
        println!("{}", self.report().render_console());
    }
}

/// Decrements the owning collector's active gauge on drop.
#[must_use = "the active gauge is decremented as soon as the guard is dropped"]
pub struct ActiveGuard<'a> {
    collector: &'a MetricsCollector,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.collector.decrement_active();
    }
}
