use std::time::Duration;

use crate::config::PerfConfig;

/// Load shapes the CLI can drive.
///
/// | Pattern    | Workers      | Sessions         | Requests/session | Submission                 |
/// |------------|--------------|------------------|------------------|----------------------------|
/// | Load       | users        | users × 10       | 1                | 100 ms pause every 10      |
/// | Stress     | stress_users | stress_users × 5 | 1                | all at once                |
/// | Spike      | spike_users  | spike_users      | 1                | all at once                |
/// | RampUp     | users        | users            | 5 (1 s think)    | spread evenly over ramp-up |
/// | Throughput | users        | until duration   | 1                | as fast as workers allow   |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Load,
    Stress,
    Spike,
    RampUp,
    Throughput,
}

impl Pattern {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "load" => Some(Pattern::Load),
            "stress" => Some(Pattern::Stress),
            "spike" => Some(Pattern::Spike),
            "ramp-up" => Some(Pattern::RampUp),
            "throughput" => Some(Pattern::Throughput),
            _ => None,
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            Pattern::Load => "load",
            Pattern::Stress => "stress",
            Pattern::Spike => "spike",
            Pattern::RampUp => "ramp-up",
            Pattern::Throughput => "throughput",
        }
    }
}

/// Sleep for `delay` after every `every` submissions. `every == 0` never pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pause {
    pub every: usize,
    pub delay: Duration,
}

impl Pause {
    pub const NONE: Pause = Pause { every: 0, delay: Duration::ZERO };

    /// Whether to pause right after submission number `index` (0-based).
    pub fn after(&self, index: usize) -> bool {
        self.every > 0 && !self.delay.is_zero() && index % self.every == 0
    }
}

/// Concrete submission schedule for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub workers: usize,
    /// Ignored when `run_for` is set.
    pub sessions: usize,
    pub requests_per_session: usize,
    pub think_time: Duration,
    pub pause: Pause,
    /// Keep submitting sessions until this much time has passed.
    pub run_for: Option<Duration>,
}

impl Plan {
    /// Build the plan for `pattern`. `config.requests_per_session`, when set,
    /// replaces the pattern's own requests per session.
    pub fn for_pattern(pattern: Pattern, config: &PerfConfig) -> Self {
        let mut plan = Self::pattern_defaults(pattern, config);
        if let Some(n) = config.requests_per_session {
            plan.requests_per_session = n;
        }
        plan
    }

    fn pattern_defaults(pattern: Pattern, config: &PerfConfig) -> Self {
        let single = |workers: usize, sessions: usize, pause: Pause| Plan {
            workers,
            sessions,
            requests_per_session: 1,
            think_time: Duration::ZERO,
            pause,
            run_for: None,
        };
        match pattern {
            Pattern::Load => single(
                config.users,
                config.users.saturating_mul(10),
                Pause { every: 10, delay: Duration::from_millis(100) },
            ),
            Pattern::Stress => single(config.stress_users, config.stress_users.saturating_mul(5), Pause::NONE),
            Pattern::Spike => single(config.spike_users, config.spike_users, Pause::NONE),
            Pattern::RampUp => Plan {
                workers: config.users,
                sessions: config.users,
                requests_per_session: 5,
                think_time: Duration::from_secs(1),
                pause: Pause { every: 1, delay: ramp_step(config.ramp_up, config.users) },
                run_for: None,
            },
            Pattern::Throughput => Plan {
                run_for: Some(config.duration),
                ..single(config.users, 0, Pause::NONE)
            },
        }
    }

    /// Total requests the plan will issue, when that is known up front.
    pub fn expected_requests(&self) -> Option<usize> {
        match self.run_for {
            Some(_) => None,
            None => Some(self.sessions.saturating_mul(self.requests_per_session)),
        }
    }
}

/// Gap between user starts so `users` starts span `ramp_up`.
fn ramp_step(ramp_up: Duration, users: usize) -> Duration {
    let users = u32::try_from(users.max(1)).unwrap_or(u32::MAX);
    ramp_up / users
}
