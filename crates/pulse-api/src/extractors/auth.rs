//! Bearer-token and API-key authentication extractors.
//!
//! Both reject with the standard envelope, carrying the request id
//! already assigned by the request-id middleware.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use pulse_core::error::AppError;

use crate::error::ApiError;
use crate::middleware::request_id::request_id_from;
use crate::state::AppState;

/// An authenticated end user, resolved from `Authorization: Bearer`.
#[derive(Debug, Clone, Copy)]
pub struct AuthRecipient {
    /// The user the token was issued to.
    pub recipient_id: Uuid,
}

impl FromRequestParts<AppState> for AuthRecipient {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = request_id_from(parts);
        let reject = |inner: AppError| ApiError {
            inner,
            request_id: request_id.clone(),
            retry_after_seconds: None,
        };

        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| reject(AppError::authentication("Missing authorization header")))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| reject(AppError::authentication("Invalid authorization scheme")))?;

        let claims = state.jwt_decoder.decode_token(token).map_err(reject)?;
        Ok(Self {
            recipient_id: claims.recipient_id(),
        })
    }
}

/// A trusted backend service, resolved from `x-api-key`.
#[derive(Debug, Clone)]
pub struct SystemProducer {
    /// The producer name the key maps to.
    pub producer: String,
}

impl FromRequestParts<AppState> for SystemProducer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = request_id_from(parts);
        let reject = |inner: AppError| ApiError {
            inner,
            request_id: request_id.clone(),
            retry_after_seconds: None,
        };

        let presented = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| reject(AppError::authentication("Missing API key")))?;

        let producer = state.api_keys.verify(presented).map_err(reject)?;
        Ok(Self {
            producer: producer.to_string(),
        })
    }
}
