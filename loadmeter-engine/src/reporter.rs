use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::collector::MetricsCollector;

/// Background task that logs a collector's report on a fixed period.
///
/// Stops when [`ConsoleReporter::stop`] is called or the handle is dropped.
pub struct ConsoleReporter {
    handle: JoinHandle<()>,
}

impl ConsoleReporter {
    /// Must be called from within a tokio runtime.
    pub fn spawn(collector: Arc<MetricsCollector>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick is immediate
            loop {
                interval.tick().await;
                let r = collector.report();
                info!(
                    collector = %r.name,
                    total = r.total_requests,
                    errors = r.error_count,
                    error_rate = %format!("{:.2}%", r.error_rate_percent),
                    p95_ms = r.p95_ms,
                    p99_ms = r.p99_ms,
                    active = r.active_requests,
                    "progress"
                );
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
