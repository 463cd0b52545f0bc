//! Background scheduling: the delivery sweep loop and cron maintenance.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_database::NotificationStore;

use crate::engine::DeliveryEngine;

/// Periodic sweep loop that fires due and retry-eligible notifications.
///
/// Catches scheduled records whose time has come, transient failures
/// whose backoff has elapsed, and anything missed because the process
/// restarted mid-delivery.
#[derive(Debug)]
pub struct DeliverySweeper {
    engine: Arc<DeliveryEngine>,
    interval: Duration,
}

impl DeliverySweeper {
    /// Create a sweeper over a delivery engine.
    pub fn new(engine: Arc<DeliveryEngine>, interval_seconds: u64) -> Self {
        Self {
            engine,
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the sweep loop until the cancel signal flips to true.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Delivery sweeper started");

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Delivery sweeper received shutdown signal");
                        break;
                    }
                }
                _ = self.sweep() => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                tracing::info!("Delivery sweeper shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(self.interval) => {}
                    }
                }
            }
        }

        tracing::info!("Delivery sweeper shut down complete");
    }

    async fn sweep(&self) {
        if let Err(e) = self.engine.sweep_once().await {
            tracing::error!("Delivery sweep failed: {}", e);
        }
    }
}

/// Cron-based scheduler for retention maintenance.
pub struct MaintenanceScheduler {
    scheduler: JobScheduler,
    store: Arc<dyn NotificationStore>,
    retention_grace_days: i64,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler")
            .field("retention_grace_days", &self.retention_grace_days)
            .finish()
    }
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler.
    pub async fn new(
        store: Arc<dyn NotificationStore>,
        retention_grace_days: i64,
    ) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            store,
            retention_grace_days,
        })
    }

    /// Register all scheduled maintenance tasks.
    pub async fn register_default_tasks(&self) -> AppResult<()> {
        self.register_retention_cleanup().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Maintenance scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Maintenance scheduler shut down");
        Ok(())
    }

    /// Retention cleanup — daily at 2 AM. Hard-deletes notifications
    /// whose expiry is past the grace window.
    async fn register_retention_cleanup(&self) -> AppResult<()> {
        let store = Arc::clone(&self.store);
        let grace_days = self.retention_grace_days;
        let job = CronJob::new_async("0 0 2 * * *", move |_uuid, _lock| {
            let store = Arc::clone(&store);
            Box::pin(async move {
                let cutoff = Utc::now() - chrono::Duration::days(grace_days);
                match store.delete_expired_before(cutoff).await {
                    Ok(0) => tracing::debug!("Retention cleanup found nothing to delete"),
                    Ok(deleted) => {
                        tracing::info!(deleted, "Retention cleanup deleted expired notifications")
                    }
                    Err(e) => tracing::error!("Retention cleanup failed: {}", e),
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create retention_cleanup schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add retention_cleanup schedule: {}", e))
        })?;

        tracing::info!("Registered: retention_cleanup (daily at 2AM)");
        Ok(())
    }
}
