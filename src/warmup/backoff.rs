//! Exponential backoff policy for warm-up retries
//!
//! The baseline policy doubles the delay after every transient failure with
//! no cap and no jitter. Both a cap and jitter can be configured; the cap is
//! applied after jitter so it always holds.

use rand::Rng;
use std::time::Duration;

/// Configuration for warm-up retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Maximum number of probes per endpoint, including the first
    pub max_retries: u32,

    /// Delay after the first transient failure
    pub initial_delay: Duration,

    /// Growth factor applied after each retry (default: 2.0)
    pub multiplier: f64,

    /// Upper bound on any single delay (default: none)
    pub max_delay: Option<Duration>,

    /// Random spread as a fraction of the delay, in `[0, 1)` (default: 0)
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(3),
            multiplier: 2.0,
            max_delay: None,
            jitter: 0.0,
        }
    }
}

impl BackoffPolicy {
    /// Create a policy with custom max retries and the default delays
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a policy with custom delays
    pub fn with_delays(max_retries: u32, initial_delay: Duration, max_delay: Option<Duration>) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            ..Default::default()
        }
    }

    /// Set the jitter fraction
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `retry` (1-based), without jitter
    ///
    /// `base_delay(1) == initial_delay`, and each following value is
    /// `multiplier` times the previous until the cap is reached.
    pub fn base_delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let initial_ms = self.initial_delay.as_millis() as f64;
        let exponential = initial_ms * self.multiplier.powi(retry.saturating_sub(1) as i32);
        self.cap(Duration::from_millis(exponential as u64))
    }

    /// Delay to actually sleep before retry number `retry`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.base_delay(retry);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }

        let spread = self.jitter.min(0.999);
        let factor = rand::thread_rng().gen_range((1.0 - spread)..=(1.0 + spread));
        self.cap(base.mul_f64(factor))
    }

    fn cap(&self, delay: Duration) -> Duration {
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}
