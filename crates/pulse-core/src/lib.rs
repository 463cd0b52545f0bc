//! # pulse-core
//!
//! Core crate for the Pulse notification service. Contains configuration
//! schemas, pagination/filter types, the cache provider trait, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Pulse crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
