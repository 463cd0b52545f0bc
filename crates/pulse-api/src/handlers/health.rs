//! Health endpoints: a cheap liveness probe and a dependency-probing
//! detailed check.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use pulse_core::traits::cache::CacheProvider;

use crate::dto::response::{DetailedHealthData, Envelope, HealthData};
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

/// `GET /api/health`
pub async fn liveness(
    State(state): State<AppState>,
    rid: RequestId,
) -> Json<Envelope<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    };
    Json(Envelope::ok("Service is healthy", data, &rid.0))
}

/// `GET /api/health/detailed`
///
/// Probes Postgres and the cache; a failed database probe degrades the
/// overall status to 503, a failed cache probe only marks the cache
/// (reads fall through to the database).
pub async fn detailed(
    State(state): State<AppState>,
    rid: RequestId,
) -> (StatusCode, Json<Envelope<DetailedHealthData>>) {
    let database_ok = state.db.health_check().await.unwrap_or(false);
    let cache_ok = state.cache.health_check().await.unwrap_or(false);

    let probe = |ok: bool| if ok { "ok" } else { "unavailable" };
    let status = if database_ok { "ok" } else { "degraded" };

    let data = DetailedHealthData {
        status: status.to_string(),
        database: probe(database_ok).to_string(),
        cache: probe(cache_ok).to_string(),
        socket_sessions: state.registry.session_count(),
        connected_recipients: state.registry.recipient_count(),
        delivery: state.delivery_metrics.snapshot(),
    };

    let http_status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (http_status, Json(Envelope::ok("Health checked", data, &rid.0)))
}
