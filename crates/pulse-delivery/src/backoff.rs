//! Retry backoff policy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngExt;

use pulse_core::config::delivery::DeliveryConfig;
use pulse_entity::ChannelDelivery;

/// Capped exponential backoff with jitter.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the second attempt.
    initial: Duration,
    /// Upper bound on any delay.
    cap: Duration,
    /// Jitter fraction (0.2 = ±20%).
    jitter: f64,
}

impl BackoffPolicy {
    /// Build the policy from delivery configuration.
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            initial: Duration::from_millis(config.initial_backoff_ms),
            cap: Duration::from_millis(config.backoff_cap_ms),
            jitter: config.backoff_jitter,
        }
    }

    /// The deterministic delay after `attempts` failed attempts.
    ///
    /// Doubles per attempt from the initial delay, capped.
    pub fn delay(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::ZERO;
        }
        let exp = attempts.saturating_sub(1).min(32);
        let raw = self
            .initial
            .saturating_mul(2u32.saturating_pow(exp));
        raw.min(self.cap)
    }

    /// The delay with jitter applied.
    pub fn jittered_delay(&self, attempts: u32) -> Duration {
        let base = self.delay(attempts);
        if base.is_zero() || self.jitter <= 0.0 {
            return base;
        }
        let factor = rand::rng().random_range(1.0 - self.jitter..=1.0 + self.jitter);
        base.mul_f64(factor)
    }

    /// Whether a channel that failed transiently is due for another
    /// attempt. The threshold is jittered so retries from records that
    /// failed together don't fire in lockstep against the same vendor.
    pub fn is_due(&self, delivery: &ChannelDelivery, now: DateTime<Utc>) -> bool {
        match delivery.last_attempt_at {
            None => true,
            Some(last) => {
                let wait = chrono::Duration::from_std(self.jittered_delay(delivery.attempts))
                    .unwrap_or_else(|_| chrono::Duration::seconds(0));
                now >= last + wait
            }
        }
    }
}
