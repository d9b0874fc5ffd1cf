use serde::{Deserialize, Serialize};

use crate::{DEFAULT_MAX_P95_MS, DEFAULT_MAX_P99_MS, DEFAULT_MIN_SUCCESS_RATE};

/// Caller-defined pass/fail limits for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaThresholds {
    pub max_p95_ms: f64,
    pub max_p99_ms: f64,
    pub min_success_rate_percent: f64,
}

impl Default for SlaThresholds {
    fn default() -> Self {
        Self {
            max_p95_ms: DEFAULT_MAX_P95_MS,
            max_p99_ms: DEFAULT_MAX_P99_MS,
            min_success_rate_percent: DEFAULT_MIN_SUCCESS_RATE,
        }
    }
}

impl SlaThresholds {
    pub fn new(max_p95_ms: f64, max_p99_ms: f64, min_success_rate_percent: f64) -> Self {
        Self { max_p95_ms, max_p99_ms, min_success_rate_percent }
    }

    /// Compare observed latencies and error rate against these limits.
    pub fn evaluate(&self, p95_ms: f64, p99_ms: f64, error_rate_percent: f64) -> SlaVerdict {
        let success_rate_percent = 100.0 - error_rate_percent;
        SlaVerdict {
            p95_met: p95_ms <= self.max_p95_ms,
            p99_met: p99_ms <= self.max_p99_ms,
            success_rate_met: success_rate_percent >= self.min_success_rate_percent,
            success_rate_percent,
        }
    }
}

/// Per-criterion result of an SLA check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaVerdict {
    pub p95_met: bool,
    pub p99_met: bool,
    pub success_rate_met: bool,
    pub success_rate_percent: f64,
}

impl SlaVerdict {
    pub fn passed(&self) -> bool {
        self.p95_met && self.p99_met && self.success_rate_met
    }
}
