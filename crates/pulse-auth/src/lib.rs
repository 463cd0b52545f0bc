//! # pulse-auth
//!
//! Authentication for the two Pulse ingress surfaces: bearer JWTs for
//! recipient-facing endpoints, and static API keys for system producers.

pub mod api_key;
pub mod jwt;

pub use api_key::ApiKeyVerifier;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
