//! Pulse server — multi-tenant user notification service.
//!
//! Main entry point that wires all crates together and starts the
//! server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use pulse_core::config::AppConfig;
use pulse_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("PULSE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Pulse v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = pulse_database::DatabasePool::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    pulse_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    let store: Arc<dyn pulse_database::NotificationStore> = Arc::new(
        pulse_database::repositories::notification::PgNotificationStore::new(db.pool().clone()),
    );

    // ── Step 2: Initialize cache ─────────────────────────────────
    tracing::info!(
        "Initializing cache (provider: {})...",
        config.cache.provider
    );
    let cache = pulse_cache::CacheManager::new(&config.cache).await?;
    tracing::info!("Cache initialized");

    // ── Step 3: Auth ─────────────────────────────────────────────
    let jwt_decoder = Arc::new(pulse_auth::JwtDecoder::new(&config.auth));
    let api_keys = Arc::new(pulse_auth::ApiKeyVerifier::new(&config.auth));

    // ── Step 4: Realtime session registry ────────────────────────
    let registry = Arc::new(pulse_realtime::SessionRegistry::new(
        config.realtime.clone(),
    ));

    // ── Step 5: Channel adapters + delivery engine ───────────────
    let adapters: Vec<Arc<dyn pulse_channels::ChannelAdapter>> = vec![
        Arc::new(pulse_channels::PushAdapter::new(config.channels.push.clone())),
        Arc::new(pulse_channels::EmailAdapter::new(
            config.channels.email.clone(),
        )),
        Arc::new(pulse_channels::InappAdapter::new()),
        Arc::new(pulse_channels::SocketAdapter::new(Arc::clone(&registry))),
    ];
    let engine = Arc::new(pulse_delivery::DeliveryEngine::new(
        Arc::clone(&store),
        adapters,
        config.delivery.clone(),
        config.channels.dispatch_concurrency,
    ));
    let delivery_metrics = engine.metrics();

    // ── Step 6: Notification service ─────────────────────────────
    let notifications = Arc::new(pulse_service::NotificationService::new(
        Arc::clone(&store),
        cache.clone(),
        Arc::clone(&registry),
        Arc::clone(&engine),
        &config.cache,
        config.delivery.max_attempts_per_channel,
    ));

    // ── Step 7: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 8: Delivery sweeper ─────────────────────────────────
    let sweeper = pulse_delivery::DeliverySweeper::new(
        Arc::clone(&engine),
        config.delivery.sweep_interval_seconds,
    );
    let sweeper_cancel = shutdown_rx.clone();
    let sweeper_handle = tokio::spawn(async move {
        sweeper.run(sweeper_cancel).await;
    });
    tracing::info!("Delivery sweeper started");

    // ── Step 9: Maintenance scheduler ────────────────────────────
    let mut scheduler = pulse_delivery::MaintenanceScheduler::new(
        Arc::clone(&store),
        config.delivery.retention_grace_days,
    )
    .await?;
    scheduler.register_default_tasks().await?;
    scheduler.start().await?;

    // ── Step 10: Build and start HTTP server ─────────────────────
    tracing::info!(
        "Starting HTTP server on {}:{}...",
        config.server.host,
        config.server.port
    );

    let rate_limiter = pulse_api::middleware::rate_limit::RateLimiter::new(
        config.server.rate_limit_burst,
        config.server.rate_limit_per_second,
    );

    let app_state = pulse_api::AppState {
        config: Arc::new(config.clone()),
        db: db.clone(),
        cache,
        jwt_decoder,
        api_keys,
        registry: Arc::clone(&registry),
        notifications,
        delivery_metrics,
        rate_limiter,
        started_at: std::time::Instant::now(),
    };

    let app = pulse_api::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Pulse server listening on {}", addr);

    // ── Step 11: Graceful shutdown ───────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 12: Drain background tasks ──────────────────────────
    tracing::info!("Waiting for background tasks to complete...");

    registry.close_all();
    scheduler.shutdown().await?;
    let _ = tokio::time::timeout(
        std::time::Duration::from_secs(config.server.shutdown_grace_seconds),
        sweeper_handle,
    )
    .await;

    tracing::info!("Pulse server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
