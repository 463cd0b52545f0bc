//! # pulse-database
//!
//! PostgreSQL connection management, the [`store::NotificationStore`]
//! trait, and its concrete sqlx-backed implementation.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;
pub mod testing;

pub use connection::DatabasePool;
pub use store::NotificationStore;
