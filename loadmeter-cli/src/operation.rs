use rand::Rng;
use std::time::Duration;

/// Stand-in for a real request: waits a random latency and answers with a
/// status code, failing at the configured rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticOperation {
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    /// Fraction of calls, in `0.0..=1.0`, answered with a 5xx.
    pub error_rate: f64,
}

pub const STATUS_OK: u16 = 200;
pub const STATUS_UNAVAILABLE: u16 = 503;

impl SyntheticOperation {
    pub fn new(latency_min_ms: u64, latency_max_ms: u64, error_rate: f64) -> Self {
        Self {
            latency_min_ms: latency_min_ms.min(latency_max_ms),
            latency_max_ms: latency_min_ms.max(latency_max_ms),
            error_rate: error_rate.clamp(0.0, 1.0),
        }
    }

    pub async fn call(&self) -> u16 {
        // ThreadRng is not Send; keep it out of the await.
        let (latency, status) = {
            let mut rng = rand::thread_rng();
            (self.sample_latency(&mut rng), self.sample_status(&mut rng))
        };
        tokio::time::sleep(latency).await;
        status
    }

    pub fn sample_latency(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_millis(rng.gen_range(self.latency_min_ms..=self.latency_max_ms))
    }

    pub fn sample_status(&self, rng: &mut impl Rng) -> u16 {
        if rng.gen_bool(self.error_rate) {
            STATUS_UNAVAILABLE
        } else {
            STATUS_OK
        }
    }
}
