//! Token-bucket rate limiting keyed by caller identity.
//!
//! The key is the bearer token or API key when present, the
//! `x-forwarded-for` address otherwise. Buckets refill continuously at
//! a fixed rate up to a burst ceiling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Shared token-bucket limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
    max_tokens: f64,
    refill_rate: f64,
}

impl RateLimiter {
    /// A limiter allowing `burst` immediate requests and `per_second`
    /// sustained throughput per key.
    pub fn new(burst: u32, per_second: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            max_tokens: f64::from(burst).max(1.0),
            refill_rate: per_second.max(0.001),
        }
    }

    /// Take one token for `key`; returns false when the bucket is dry.
    pub fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert(TokenBucket {
            tokens: self.max_tokens,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Seconds until a dry bucket earns its next token.
    pub fn retry_hint_seconds(&self) -> u64 {
        (1.0 / self.refill_rate).ceil().max(1.0) as u64
    }
}

/// Identity used to bucket the request.
fn limiter_key(request: &Request) -> String {
    let headers = request.headers();
    for name in ["authorization", "x-api-key", "x-forwarded-for"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if !value.is_empty() {
                return format!("{name}:{value}");
            }
        }
    }
    "anonymous".to_string()
}

/// Reject requests over the per-caller allowance with 429 and a retry
/// hint.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = limiter_key(&request);
    if state.rate_limiter.check(&key) {
        return next.run(request).await;
    }

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone());
    ApiError::rate_limited(request_id, state.rate_limiter.retry_hint_seconds()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_honored_then_exhausted() {
        let limiter = RateLimiter::new(3, 0.001);
        for _ in 0..3 {
            assert!(limiter.check("caller"));
        }
        assert!(!limiter.check("caller"));
    }

    #[test]
    fn keys_are_isolated() {
        let limiter = RateLimiter::new(1, 0.001);
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        assert!(limiter.check("b"));
    }

    #[test]
    fn retry_hint_reflects_refill_rate() {
        assert_eq!(RateLimiter::new(1, 10.0).retry_hint_seconds(), 1);
        assert_eq!(RateLimiter::new(1, 0.25).retry_hint_seconds(), 4);
    }
}
