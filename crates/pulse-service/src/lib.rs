//! # pulse-service
//!
//! Business logic service layer for Pulse. The notification service
//! orchestrates the store, cache, delivery engine, and realtime
//! registry to implement application-level use cases.
//!
//! Services follow constructor injection: all dependencies are
//! provided at construction time via `Arc` references.

pub mod notification;

pub use notification::{CreateNotificationParams, ListQuery, NotificationService};
