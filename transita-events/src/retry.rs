use rand::Rng;
use std::time::Duration;

/// Delivery retry policy. Each subscription owns its own instance; there is
/// no shared retry state across handlers.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// No backoff between attempts. Used by tests and in-process wiring where
    /// waiting buys nothing.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Exponential backoff with up to 25% jitter, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);

        let jitter_ceiling = (backoff.as_millis() as u64) / 4;
        if jitter_ceiling == 0 {
            return backoff;
        }
        let jitter = rand::thread_rng().gen_range(0..=jitter_ceiling);
        backoff + Duration::from_millis(jitter)
    }
}
