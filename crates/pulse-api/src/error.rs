//! Maps domain `AppError` values to HTTP responses in the standard
//! envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use pulse_core::error::{AppError, ErrorKind};

use crate::dto::response::Envelope;
use crate::middleware::request_id::RequestId;

/// An `AppError` paired with the request correlation id.
///
/// Handlers and extractors convert domain errors into `ApiError` so
/// the response envelope can carry `requestId`; a bare `From` is kept
/// for call sites that have no id at hand.
#[derive(Debug)]
pub struct ApiError {
    /// The underlying domain error.
    pub inner: AppError,
    /// Correlation id assigned by the request-id middleware.
    pub request_id: Option<String>,
    /// Retry hint in seconds, set only for rate-limit responses.
    pub retry_after_seconds: Option<u64>,
}

impl ApiError {
    /// Attach the request id to a domain error.
    pub fn new(inner: AppError, request_id: &RequestId) -> Self {
        Self {
            inner,
            request_id: Some(request_id.0.clone()),
            retry_after_seconds: None,
        }
    }

    /// A rate-limit rejection with a retry hint.
    pub fn rate_limited(request_id: Option<String>, retry_after_seconds: u64) -> Self {
        Self {
            inner: AppError::rate_limited("Too many requests"),
            request_id,
            retry_after_seconds: Some(retry_after_seconds),
        }
    }

    /// HTTP status and machine-readable code for an error kind.
    pub fn status_and_code(kind: ErrorKind) -> (StatusCode, &'static str) {
        match kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::RateLimit => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ErrorKind::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Cache
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::ExternalService => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(inner: AppError) -> Self {
        Self {
            inner,
            request_id: None,
            retry_after_seconds: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = Self::status_and_code(self.inner.kind);
        let request_id = self.request_id.unwrap_or_else(|| "unknown".to_string());

        // Internal detail stays in the log; the client sees a generic
        // message keyed by the request id.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                request_id = %request_id,
                error = %self.inner,
                "Internal server error"
            );
            "Internal server error".to_string()
        } else {
            self.inner.message.clone()
        };

        let mut envelope = Envelope::<()>::error(message, code, &request_id);
        envelope.retry_after = self.retry_after_seconds;
        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_expected_statuses() {
        let cases = [
            (ErrorKind::Validation, StatusCode::BAD_REQUEST),
            (ErrorKind::Authentication, StatusCode::UNAUTHORIZED),
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::Conflict, StatusCode::CONFLICT),
            (ErrorKind::RateLimit, StatusCode::TOO_MANY_REQUESTS),
            (ErrorKind::Database, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(ApiError::status_and_code(kind).0, status);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err: ApiError = AppError::database("connection refused to 10.0.0.3").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
