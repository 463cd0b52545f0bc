//! JWT token creation with configurable signing and TTL.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use pulse_core::config::auth::AuthConfig;
use pulse_core::error::AppError;

use super::claims::Claims;

/// Creates signed bearer tokens for recipients.
///
/// Pulse does not run a login flow itself; the encoder exists for the
/// test suite and for operator tooling that mints tokens directly.
#[derive(Debug, Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Token TTL in seconds.
    token_ttl_seconds: i64,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl_seconds: config.token_ttl_seconds as i64,
        }
    }

    /// Generates a bearer token for the given recipient.
    pub fn generate_token(&self, recipient_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::seconds(self.token_ttl_seconds);

        let claims = Claims {
            sub: recipient_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }
}
