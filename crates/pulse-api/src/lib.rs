//! # pulse-api
//!
//! HTTP ingress layer for Pulse built on Axum.
//!
//! Provides the REST endpoints, WebSocket upgrade, middleware
//! (request-id, logging, rate limiting, CORS), extractors, DTOs, and
//! the error-to-HTTP mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
