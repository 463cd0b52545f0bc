//! Notification use cases: create, query, read mutations, delete.

pub mod service;

pub use service::{CreateNotificationParams, ListQuery, NotificationService};
