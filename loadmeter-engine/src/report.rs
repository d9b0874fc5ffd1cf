use loadmeter_common::{SlaThresholds, SlaVerdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Width of the `=` rule framing the console block.
pub const SEPARATOR_WIDTH: usize = 80;

/// Point-in-time statistics for one collector.
///
/// Latency fields are in milliseconds and cover every recorded sample,
/// successful or not. `throughput_rps` is only present when the caller told
/// the collector how long the run took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub total_requests: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// Length of the sample log the statistics were computed from.
    #[serde(default)]
    pub sample_count: u64,
    pub error_rate_percent: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
    pub active_requests: i64,
    pub throughput_rps: Option<f64>,
}

impl Report {
    /// Build a report from an unsorted copy of the sample log.
    pub fn from_samples(
        name: &str,
        mut samples: Vec<u64>,
        success_count: u64,
        error_count: u64,
        active_requests: i64,
        elapsed: Option<Duration>,
    ) -> Self {
        samples.sort_unstable();

        let total_requests = success_count + error_count;
        let error_rate_percent = if total_requests == 0 {
            0.0
        } else {
            error_count as f64 * 100.0 / total_requests as f64
        };

        let mean_ms = if samples.is_empty() {
            0.0
        } else {
            let sum: u128 = samples.iter().map(|&s| s as u128).sum();
            sum as f64 / samples.len() as f64
        };

        let throughput_rps = elapsed
            .map(|e| e.as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .map(|secs| total_requests as f64 / secs);

        Report {
            name: name.to_string(),
            total_requests,
            success_count,
            error_count,
            sample_count: samples.len() as u64,
            error_rate_percent,
            mean_ms,
            median_ms: percentile(&samples, 50.0) as f64,
            p95_ms: percentile(&samples, 95.0) as f64,
            p99_ms: percentile(&samples, 99.0) as f64,
            max_ms: samples.last().copied().unwrap_or(0) as f64,
            active_requests,
            throughput_rps,
        }
    }

    pub fn success_rate_percent(&self) -> f64 {
        100.0 - self.error_rate_percent
    }

    /// Mean-latency approximation: `1000 / mean_ms` per worker.
    ///
    /// Ignores think time, queueing and idle workers, so it overstates real
    /// throughput whenever the pool is not saturated. Prefer `throughput_rps`.
    pub fn estimated_throughput_rps(&self, workers: usize) -> f64 {
        if self.mean_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / self.mean_ms * workers as f64
    }

    pub fn sla_verdict(&self, thresholds: &SlaThresholds) -> SlaVerdict {
        thresholds.evaluate(self.p95_ms, self.p99_ms, self.error_rate_percent)
    }

    pub fn meets_sla(&self, thresholds: &SlaThresholds) -> bool {
        self.sla_verdict(thresholds).passed()
    }

    /// The report framed by separator lines, as printed to the console.
    pub fn render_console(&self) -> String {
        let rule = "=".repeat(SEPARATOR_WIDTH);
        format!("{rule}\nPERFORMANCE TEST REPORT: {}\n{rule}\n{}\n{rule}\n", self.name, self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Requests: {}", self.total_requests)?;
        writeln!(f, "Total Errors: {} ({:.2}%)", self.error_count, self.error_rate_percent)?;
        writeln!(f, "Mean Response Time: {:.2} ms", self.mean_ms)?;
        writeln!(f, "Median Response Time: {:.2} ms", self.median_ms)?;
        writeln!(f, "95th Percentile: {:.2} ms", self.p95_ms)?;
        writeln!(f, "99th Percentile: {:.2} ms", self.p99_ms)?;
        writeln!(f, "Max Response Time: {:.2} ms", self.max_ms)?;
        match self.throughput_rps {
            Some(rps) => writeln!(f, "Throughput: {rps:.2} req/sec")?,
            None => writeln!(f, "Throughput: n/a")?,
        }
        write!(f, "Active Requests: {}", self.active_requests)
    }
}

/// Check `report` against latency and success-rate limits.
pub fn meets_sla(report: &Report, max_p95_ms: f64, max_p99_ms: f64, min_success_rate_percent: f64) -> bool {
    report.meets_sla(&SlaThresholds::new(max_p95_ms, max_p99_ms, min_success_rate_percent))
}

/// Nearest-rank percentile of an ascending slice: the element at
/// `ceil(p / 100 * n) - 1`, clamped to the slice. Returns 0 for an empty slice.
pub fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let n = sorted.len();
    // Multiply before dividing so whole-number ranks stay exact.
    let rank = (p * n as f64 / 100.0).ceil() as usize;
    sorted[rank.saturating_sub(1).min(n - 1)]
}
