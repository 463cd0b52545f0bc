//! Delivery engine configuration: retries, scheduling, retention.

use serde::{Deserialize, Serialize};

/// Delivery engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Maximum dispatch attempts per channel.
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_channel: u32,
    /// Initial retry delay in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Retry delay cap in milliseconds.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Jitter fraction applied to each delay (0.2 = ±20%).
    #[serde(default = "default_jitter")]
    pub backoff_jitter: f64,
    /// How often the scheduler sweeps for due notifications, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// How many due notifications a single sweep may fire.
    #[serde(default = "default_sweep_batch")]
    pub sweep_batch_size: i64,
    /// Days past `expires_at` before a record is hard-deleted.
    #[serde(default = "default_retention_grace")]
    pub retention_grace_days: i64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts_per_channel: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            backoff_jitter: default_jitter(),
            sweep_interval_seconds: default_sweep_interval(),
            sweep_batch_size: default_sweep_batch(),
            retention_grace_days: default_retention_grace(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_backoff_cap_ms() -> u64 {
    300_000
}

fn default_jitter() -> f64 {
    0.2
}

fn default_sweep_interval() -> u64 {
    5
}

fn default_sweep_batch() -> i64 {
    100
}

fn default_retention_grace() -> i64 {
    7
}
