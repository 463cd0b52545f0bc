//! Monotonic delivery counters.
//!
//! Shared between the engine and the detailed health endpoint; counts
//! reset on restart.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters updated by the engine on every dispatch outcome.
#[derive(Debug, Default)]
pub struct DeliveryMetrics {
    dispatched: AtomicU64,
    transient_failures: AtomicU64,
    permanent_failures: AtomicU64,
}

impl DeliveryMetrics {
    /// Record a successful dispatch (accepted or delivered).
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a transient failure (will be retried).
    pub fn record_transient(&self) {
        self.transient_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a permanent failure (channel gave up).
    pub fn record_permanent(&self) {
        self.permanent_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough point-in-time view of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            transient_failures: self.transient_failures.load(Ordering::Relaxed),
            permanent_failures: self.permanent_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter snapshot for the health payload.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Dispatches that reached the vendor (accepted or delivered).
    pub dispatched: u64,
    /// Failures that will be retried.
    pub transient_failures: u64,
    /// Failures that exhausted a channel.
    pub permanent_failures: u64,
}
