//! Authentication extractors.

pub mod auth;

pub use auth::{AuthRecipient, SystemProducer};
