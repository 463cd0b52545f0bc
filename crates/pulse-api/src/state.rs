//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use pulse_auth::{ApiKeyVerifier, JwtDecoder};
use pulse_cache::CacheManager;
use pulse_core::config::AppConfig;
use pulse_database::DatabasePool;
use pulse_delivery::DeliveryMetrics;
use pulse_realtime::session::registry::SessionRegistry;
use pulse_service::NotificationService;

use crate::middleware::rate_limit::RateLimiter;

/// Shared dependencies, passed to every handler via `State<AppState>`.
///
/// All heavyweight fields are `Arc`-wrapped for cheap cloning across
/// tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL pool, used directly only by the health endpoint.
    pub db: DatabasePool,
    /// Cache manager (Redis or in-memory).
    pub cache: CacheManager,
    /// Bearer token validator.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// System producer API key verifier.
    pub api_keys: Arc<ApiKeyVerifier>,
    /// Live socket session registry.
    pub registry: Arc<SessionRegistry>,
    /// Notification orchestration service.
    pub notifications: Arc<NotificationService>,
    /// Delivery engine counters for the detailed health payload.
    pub delivery_metrics: Arc<DeliveryMetrics>,
    /// Token-bucket rate limiter.
    pub rate_limiter: RateLimiter,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}
