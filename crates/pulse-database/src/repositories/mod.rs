//! Concrete sqlx-backed store implementations.

pub mod notification;

pub use notification::PgNotificationStore;
