//! JWT token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use pulse_core::config::auth::AuthConfig;
use pulse_core::error::AppError;

use super::claims::Claims;

/// Validates recipient bearer tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a bearer token string.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use uuid::Uuid;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-at-least-32-characters!!".to_string(),
            token_ttl_seconds: 3600,
            system_api_keys: Default::default(),
        }
    }

    #[test]
    fn encode_decode_roundtrip() {
        let config = test_config();
        let recipient = Uuid::new_v4();
        let token = JwtEncoder::new(&config).generate_token(recipient).unwrap();
        let claims = JwtDecoder::new(&config).decode_token(&token).unwrap();
        assert_eq!(claims.recipient_id(), recipient);
        assert!(!claims.is_expired());
    }

    #[test]
    fn rejects_wrong_secret() {
        let config = test_config();
        let token = JwtEncoder::new(&config)
            .generate_token(Uuid::new_v4())
            .unwrap();

        let mut other = test_config();
        other.jwt_secret = "another-secret-also-32-characters!!!".to_string();
        let err = JwtDecoder::new(&other).decode_token(&token).unwrap_err();
        assert_eq!(err.kind, pulse_core::error::ErrorKind::Authentication);
    }

    #[test]
    fn rejects_garbage() {
        let config = test_config();
        assert!(JwtDecoder::new(&config).decode_token("not.a.jwt").is_err());
    }
}
