//! Shared test helpers for integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use pulse_api::middleware::rate_limit::RateLimiter;
use pulse_auth::{ApiKeyVerifier, JwtDecoder, JwtEncoder};
use pulse_cache::CacheManager;
use pulse_core::config::app::{CorsConfig, ServerConfig};
use pulse_core::config::auth::AuthConfig;
use pulse_core::config::cache::CacheConfig;
use pulse_core::config::channels::ChannelsConfig;
use pulse_core::config::delivery::DeliveryConfig;
use pulse_core::config::logging::LoggingConfig;
use pulse_core::config::realtime::RealtimeConfig;
use pulse_core::config::{AppConfig, DatabaseConfig};
use pulse_database::DatabasePool;
use pulse_database::testing::MockStore;
use pulse_delivery::DeliveryEngine;
use pulse_realtime::SessionRegistry;
use pulse_service::NotificationService;

/// The API key accepted by the test app.
pub const TEST_API_KEY: &str = "mk_test_key";
/// The producer name the test API key maps to.
pub const TEST_PRODUCER: &str = "matching-service";

/// Test application context backed by in-memory infrastructure.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Direct access to the backing store
    pub store: Arc<MockStore>,
    /// Token mint for bearer auth
    encoder: JwtEncoder,
}

impl TestApp {
    /// Create a test application with default settings.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a test application with a custom configuration.
    pub async fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MockStore::default());
        let cache = CacheManager::new(&config.cache)
            .await
            .expect("Failed to init cache");
        let registry = Arc::new(SessionRegistry::new(config.realtime.clone()));

        // In-memory adapters only; push and email stay untested here.
        let adapters: Vec<Arc<dyn pulse_channels::ChannelAdapter>> = vec![
            Arc::new(pulse_channels::InappAdapter::new()),
            Arc::new(pulse_channels::SocketAdapter::new(Arc::clone(&registry))),
        ];
        let engine = Arc::new(DeliveryEngine::new(
            store.clone() as Arc<dyn pulse_database::NotificationStore>,
            adapters,
            config.delivery.clone(),
            4,
        ));

        let notifications = Arc::new(NotificationService::new(
            store.clone() as Arc<dyn pulse_database::NotificationStore>,
            cache.clone(),
            Arc::clone(&registry),
            Arc::clone(&engine),
            &config.cache,
            config.delivery.max_attempts_per_channel,
        ));

        let encoder = JwtEncoder::new(&config.auth);
        let rate_limiter = RateLimiter::new(
            config.server.rate_limit_burst,
            config.server.rate_limit_per_second,
        );

        let state = pulse_api::AppState {
            config: Arc::new(config.clone()),
            db: DatabasePool::connect_lazy(&config.database).expect("Failed to build lazy pool"),
            cache,
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            api_keys: Arc::new(ApiKeyVerifier::new(&config.auth)),
            registry,
            notifications,
            delivery_metrics: engine.metrics(),
            rate_limiter,
            started_at: Instant::now(),
        };

        Self {
            router: pulse_api::build_router(state),
            store,
            encoder,
        }
    }

    /// Mint a bearer token for the given recipient.
    pub fn token_for(&self, recipient_id: Uuid) -> String {
        self.encoder
            .generate_token(recipient_id)
            .expect("Failed to mint token")
    }

    /// Make an HTTP request to the test app with bearer auth.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut headers = Vec::new();
        let bearer;
        if let Some(token) = token {
            bearer = format!("Bearer {}", token);
            headers.push(("authorization", bearer.as_str()));
        }
        self.request_with_headers(method, path, body, &headers)
            .await
    }

    /// Make an HTTP request with arbitrary extra headers.
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let response_headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers: response_headers,
            body,
        }
    }

    /// Create a notification through the API and return its id.
    pub async fn create_notification(&self, token: &str, title: &str) -> Uuid {
        let body = serde_json::json!({
            "title": title,
            "message": "body",
            "type": "message",
            "channels": ["inapp"],
        });
        let response = self
            .request("POST", "/api/notifications", Some(body), Some(token))
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Create failed: {:?}",
            response.body
        );
        response.body["data"]["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("No id in create response")
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

/// A configuration wired entirely to in-process backends.
pub fn test_config() -> AppConfig {
    let mut system_api_keys = HashMap::new();
    system_api_keys.insert(TEST_PRODUCER.to_string(), TEST_API_KEY.to_string());

    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_seconds: 30,
            shutdown_grace_seconds: 1,
            // High enough that only the dedicated test trips it.
            rate_limit_burst: 10_000,
            rate_limit_per_second: 10_000.0,
            cors: CorsConfig::default(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost:5432/pulse_test".to_string(),
            max_connections: 2,
            min_connections: 0,
            connect_timeout_seconds: 1,
            statement_timeout_seconds: 1,
        },
        cache: CacheConfig::default(),
        auth: AuthConfig {
            jwt_secret: "integration-test-secret".to_string(),
            token_ttl_seconds: 3600,
            system_api_keys,
        },
        channels: ChannelsConfig::default(),
        delivery: DeliveryConfig::default(),
        realtime: RealtimeConfig::default(),
        logging: LoggingConfig::default(),
    }
}
