//! Exponential backoff with jitter
//!
//! Retry delays grow geometrically from an initial delay, are capped, and
//! are spread by a random jitter so that clients retrying the same node do
//! not line up.

use rand::Rng;
use std::time::Duration;

/// Backoff strategy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
    /// Growth factor applied after each retry
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: 0.2,
            max_attempts: 3,
        }
    }
}

impl BackoffConfig {
    /// Create a new backoff config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Set jitter factor (clamped to 0.0..=1.0)
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Set maximum attempts (at least one)
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Un-jittered delay before retry number `retry` (0-indexed)
    pub fn base_delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry.min(32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Iterator over the delays between attempts.
///
/// Yields `max_attempts - 1` delays: the first attempt runs immediately.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    retry: u32,
}

impl ExponentialBackoff {
    /// Create a new backoff instance
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, retry: 0 }
    }

    /// Number of delays handed out so far
    pub fn retries(&self) -> u32 {
        self.retry
    }

    /// Check if another retry is allowed
    pub fn can_retry(&self) -> bool {
        self.retry + 1 < self.config.max_attempts
    }

    /// Reset the backoff state
    pub fn reset(&mut self) {
        self.retry = 0;
    }

    fn jittered(&self, base: Duration) -> Duration {
        if self.config.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let spread = base.as_secs_f64() * self.config.jitter;
        let offset = rand::thread_rng().gen_range(-spread..=spread);
        let secs = (base.as_secs_f64() + offset)
            .max(0.0)
            .min(self.config.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

impl Iterator for ExponentialBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.can_retry() {
            return None;
        }
        let delay = self.jittered(self.config.base_delay_for(self.retry));
        self.retry += 1;
        Some(delay)
    }
}
