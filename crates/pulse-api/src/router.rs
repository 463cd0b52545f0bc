//! Route definitions for the Pulse HTTP API.
//!
//! Routes are organized by domain and mounted under `/api`; the live
//! socket upgrade sits at the root. The router receives `AppState` and
//! passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use pulse_core::config::app::CorsConfig;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Largest accepted request body; payloads are metadata-sized JSON.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(notification_routes())
        .merge(system_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_handler));

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::enforce_rate_limit,
        ))
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        // Added last so it runs first and the id is visible everywhere.
        .layer(axum_middleware::from_fn(
            middleware::request_id::assign_request_id,
        ))
        .with_state(state)
}

/// Recipient-facing notification endpoints (bearer auth).
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(handlers::notification::list))
        .route("/notifications", post(handlers::notification::create))
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/grouped",
            get(handlers::notification::grouped),
        )
        .route(
            "/notifications/mark-all-read",
            patch(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/types/{type}",
            get(handlers::notification::list_by_kind),
        )
        .route("/notifications/{id}", get(handlers::notification::get_one))
        .route(
            "/notifications/{id}",
            delete(handlers::notification::delete_one),
        )
        .route(
            "/notifications/{id}/read",
            patch(handlers::notification::mark_read),
        )
}

/// Trusted producer endpoints (API-key auth).
fn system_routes() -> Router<AppState> {
    Router::new().route(
        "/system/notifications",
        post(handlers::notification::system_create),
    )
}

/// Health check endpoints (no auth required).
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::liveness))
        .route("/health/detailed", get(handlers::health::detailed))
}

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    use http::Method;
    use tower_http::cors::Any;

    let mut cors = CorsLayer::new();

    if config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<http::HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    if config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    }

    cors.max_age(std::time::Duration::from_secs(config.max_age_seconds))
}
