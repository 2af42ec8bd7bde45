use std::time::Duration;

use rand::Rng;

/// Bounded retry policy, applied once per logical fetch operation.
/// The delay after attempt `n` (0-based) is `base_delay * multiplier^n`,
/// plus up to `jitter` when set.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub jitter: Option<Duration>,
}

impl RetryPolicy {
    /// Fixed-interval policy: `max_attempts` tries with `delay` between each.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            multiplier: 1.0,
            jitter: None,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Delay to sleep after the given 0-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.mul_f64(self.multiplier.powi(attempt as i32));
        match self.jitter {
            Some(jitter) if !jitter.is_zero() => {
                let extra = rand::rng().random_range(0..=jitter.as_millis() as u64);
                scaled + Duration::from_millis(extra)
            }
            _ => scaled,
        }
    }
}

impl Default for RetryPolicy {
    /// Five attempts, two seconds apart.
    fn default() -> Self {
        Self::fixed(5, Duration::from_secs(2))
    }
}
