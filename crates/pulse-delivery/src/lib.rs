//! # pulse-delivery
//!
//! The delivery engine: fans a notification out to its requested
//! channels, folds adapter outcomes back into the store, and retries
//! transient failures with capped exponential backoff. A periodic
//! sweep picks up scheduled and retry-eligible records; a cron
//! scheduler handles retention cleanup.

pub mod backoff;
pub mod engine;
pub mod metrics;
pub mod scheduler;

pub use backoff::BackoffPolicy;
pub use engine::DeliveryEngine;
pub use metrics::{DeliveryMetrics, MetricsSnapshot};
pub use scheduler::{DeliverySweeper, MaintenanceScheduler};
