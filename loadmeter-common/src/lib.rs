use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod outcome;
pub mod sla;

pub use outcome::{Outcome, SuccessPolicy};
pub use sla::{SlaThresholds, SlaVerdict};

/// How long `shutdown` waits for queued and in-flight tasks before aborting workers.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

pub const DEFAULT_USERS: usize = 10;
pub const DEFAULT_RAMP_UP_SECS: u64 = 10;
pub const DEFAULT_DURATION_SECS: u64 = 60;
pub const DEFAULT_SPIKE_USERS: usize = 50;
pub const DEFAULT_STRESS_USERS: usize = 100;

pub const DEFAULT_MAX_P95_MS: f64 = 3_000.0;
pub const DEFAULT_MAX_P99_MS: f64 = 5_000.0;
pub const DEFAULT_MIN_SUCCESS_RATE: f64 = 99.0;

/// Error types for LoadMeter operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadMeterError {
    #[error("Cannot {operation}: load generator is {state}")]
    IllegalState { operation: String, state: String },

    #[error("Worker capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    #[error("Load generator must be started from within a tokio runtime")]
    NoRuntime,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LoadMeterError {
    pub fn illegal_state(operation: &str, state: impl ToString) -> Self {
        LoadMeterError::IllegalState {
            operation: operation.to_string(),
            state: state.to_string(),
        }
    }
}

/// Result type for LoadMeter operations
pub type Result<T> = std::result::Result<T, LoadMeterError>;
