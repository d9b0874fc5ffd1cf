use loadmeter_common::{
    LoadMeterError, Result, SlaThresholds, DEFAULT_DURATION_SECS, DEFAULT_RAMP_UP_SECS,
    DEFAULT_SPIKE_USERS, DEFAULT_STRESS_USERS, DEFAULT_USERS,
};
use std::path::Path;
use std::time::Duration;

/// Upper bound for any worker count; keeps session arithmetic in range.
pub const MAX_USERS: usize = 100_000;

/// Upper bound for `requests_per_session`.
pub const MAX_REQUESTS_PER_SESSION: usize = 1_000_000;

/// Run parameters shared by every load pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfConfig {
    pub users: usize,
    pub ramp_up: Duration,
    pub duration: Duration,
    pub spike_users: usize,
    pub stress_users: usize,
    /// Overrides the pattern's requests per session when set.
    pub requests_per_session: Option<usize>,
    pub sla: SlaThresholds,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            users: DEFAULT_USERS,
            ramp_up: Duration::from_secs(DEFAULT_RAMP_UP_SECS),
            duration: Duration::from_secs(DEFAULT_DURATION_SECS),
            spike_users: DEFAULT_SPIKE_USERS,
            stress_users: DEFAULT_STRESS_USERS,
            requests_per_session: None,
            sla: SlaThresholds::default(),
        }
    }
}

impl PerfConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("users", self.users),
            ("spike users", self.spike_users),
            ("stress users", self.stress_users),
        ] {
            if value == 0 {
                return Err(LoadMeterError::InvalidConfig(format!("{name} must be at least 1")));
            }
            if value > MAX_USERS {
                return Err(LoadMeterError::InvalidConfig(format!("{name} must be at most {MAX_USERS}, got {value}")));
            }
        }
        if let Some(n) = self.requests_per_session {
            if n == 0 || n > MAX_REQUESTS_PER_SESSION {
                return Err(LoadMeterError::InvalidConfig(format!(
                    "requests per session must be within 1..={MAX_REQUESTS_PER_SESSION}, got {n}"
                )));
            }
        }
        let rate = self.sla.min_success_rate_percent;
        if !(0.0..=100.0).contains(&rate) {
            return Err(LoadMeterError::InvalidConfig(format!(
                "minimum success rate must be within 0..=100, got {rate}"
            )));
        }
        if self.sla.max_p95_ms < 0.0 || self.sla.max_p99_ms < 0.0 {
            return Err(LoadMeterError::InvalidConfig("latency thresholds must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Read SLA thresholds from a JSON file. Missing fields keep their defaults.
pub fn load_sla_file(path: &Path) -> Result<SlaThresholds> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| LoadMeterError::InvalidConfig(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| LoadMeterError::InvalidConfig(format!("{}: {e}", path.display())))
}
