use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One completed operation: how long it took and whether the caller counted it as a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub elapsed_ms: u64,
    pub success: bool,
}

impl Outcome {
    pub fn new(elapsed_ms: u64, success: bool) -> Self {
        Self { elapsed_ms, success }
    }

    pub fn success(elapsed_ms: u64) -> Self {
        Self::new(elapsed_ms, true)
    }

    pub fn error(elapsed_ms: u64) -> Self {
        Self::new(elapsed_ms, false)
    }

    /// Build an outcome from a measured duration. Sub-millisecond remainders are truncated.
    pub fn from_elapsed(elapsed: Duration, success: bool) -> Self {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        Self::new(ms, success)
    }

    /// Classify an HTTP-like status code with `policy`.
    pub fn from_status(elapsed: Duration, status: u16, policy: SuccessPolicy) -> Self {
        Self::from_elapsed(elapsed, policy.is_success(status))
    }
}

/// Which status codes count as a successful operation.
///
/// The collector never looks at status codes itself; callers pick a policy
/// and hand it a pre-classified [`Outcome`].
#[derive(Debug, Clone, Copy, Default)]
pub enum SuccessPolicy {
    /// `200..300`
    #[default]
    Only2xx,
    /// `200..400`
    Allow3xx,
    Custom(fn(u16) -> bool),
}

impl SuccessPolicy {
    pub fn is_success(&self, status: u16) -> bool {
        match self {
            SuccessPolicy::Only2xx => (200..300).contains(&status),
            SuccessPolicy::Allow3xx => (200..400).contains(&status),
            SuccessPolicy::Custom(f) => f(status),
        }
    }
}
