//! The fan-out delivery engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pulse_channels::ChannelAdapter;
use pulse_core::config::delivery::DeliveryConfig;
use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_database::NotificationStore;
use pulse_entity::{Channel, DeliveryOutcome, Notification, NotificationState};

use crate::backoff::BackoffPolicy;
use crate::metrics::DeliveryMetrics;

/// Fans notifications out to their requested channels.
///
/// The engine holds no authoritative delivery state: per-channel
/// bookkeeping lives in the store and every outcome is folded in via
/// an atomic read-modify-write. Channels are attempted in the stable
/// dispatch order, one record at a time; concurrency is bounded by a
/// shared permit pool.
pub struct DeliveryEngine {
    store: Arc<dyn NotificationStore>,
    adapters: BTreeMap<Channel, Arc<dyn ChannelAdapter>>,
    policy: BackoffPolicy,
    config: DeliveryConfig,
    permits: Arc<Semaphore>,
    metrics: Arc<DeliveryMetrics>,
}

impl std::fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DeliveryEngine {
    /// Build the engine over a store and a set of adapters.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        adapters: Vec<Arc<dyn ChannelAdapter>>,
        config: DeliveryConfig,
        concurrency: usize,
    ) -> Self {
        let adapters: BTreeMap<Channel, Arc<dyn ChannelAdapter>> = adapters
            .into_iter()
            .map(|a| (a.channel(), a))
            .collect();
        Self {
            store,
            policy: BackoffPolicy::from_config(&config),
            config,
            adapters,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            metrics: Arc::new(DeliveryMetrics::default()),
        }
    }

    /// The engine's monotonic dispatch counters.
    pub fn metrics(&self) -> Arc<DeliveryMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Deliver one notification by ID: dispatch every channel that is
    /// currently eligible. Called right after create and from sweeps.
    pub async fn deliver(&self, id: Uuid) -> AppResult<()> {
        let Some(notification) = self.store.find_by_id(id).await? else {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        };
        self.fan_out(&notification, Utc::now()).await
    }

    /// One sweep pass: fire every due notification, oldest first.
    ///
    /// Returns the number of records processed.
    pub async fn sweep_once(&self) -> AppResult<usize> {
        let now = Utc::now();
        let due = self
            .store
            .find_due(
                now,
                self.config.sweep_batch_size,
                self.config.max_attempts_per_channel,
            )
            .await?;
        let count = due.len();
        for notification in &due {
            if let Err(e) = self.fan_out(notification, now).await {
                warn!(id = %notification.id, error = %e, "Sweep delivery failed");
            }
        }
        if count > 0 {
            debug!(count, "Delivery sweep processed due notifications");
        }
        Ok(count)
    }

    /// Dispatch all eligible channels of one record, in stable order.
    async fn fan_out(&self, notification: &Notification, now: DateTime<Utc>) -> AppResult<()> {
        if notification.state == NotificationState::Read {
            return Ok(());
        }
        if let Some(scheduled) = notification.scheduled_at {
            if scheduled > now {
                return Ok(());
            }
        }
        if notification.is_expired() {
            return Ok(());
        }

        for channel in Channel::DISPATCH_ORDER {
            let Some(delivery) = notification.per_channel.get(&channel) else {
                continue;
            };
            if !delivery.enabled
                || delivery.is_terminal(self.config.max_attempts_per_channel)
                || !self.policy.is_due(delivery, now)
            {
                continue;
            }
            self.dispatch_channel(notification, channel).await?;
        }
        Ok(())
    }

    /// Run one adapter call and fold the outcome into the store.
    async fn dispatch_channel(&self, notification: &Notification, channel: Channel) -> AppResult<()> {
        let outcome = match self.adapters.get(&channel) {
            Some(adapter) => {
                let _permit = self
                    .permits
                    .acquire()
                    .await
                    .map_err(|_| AppError::service_unavailable("Delivery engine shut down"))?;
                adapter.dispatch(notification).await
            }
            None => DeliveryOutcome::Permanent(format!("No adapter for channel {channel}")),
        };

        match &outcome {
            DeliveryOutcome::Accepted | DeliveryOutcome::Delivered => {
                self.metrics.record_dispatched();
                info!(id = %notification.id, %channel, ?outcome, "Channel dispatched");
            }
            DeliveryOutcome::Transient(reason) => {
                self.metrics.record_transient();
                debug!(id = %notification.id, %channel, reason, "Transient dispatch failure");
            }
            DeliveryOutcome::Permanent(reason) => {
                self.metrics.record_permanent();
                warn!(id = %notification.id, %channel, reason, "Permanent dispatch failure");
            }
        }

        self.store
            .apply_delivery_outcome(
                notification.id,
                channel,
                &outcome,
                self.config.max_attempts_per_channel,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_channels::testing::ScriptedAdapter;
    use pulse_database::testing::MockStore;
    use pulse_entity::test_support;

    fn engine(
        store: Arc<MockStore>,
        adapters: Vec<Arc<dyn ChannelAdapter>>,
    ) -> DeliveryEngine {
        DeliveryEngine::new(store, adapters, DeliveryConfig::default(), 4)
    }

    #[tokio::test]
    async fn accepted_outcome_moves_record_to_sent() {
        let store = Arc::new(MockStore::default());
        let notification = test_support::notification_for(
            Uuid::new_v4(),
            &[Channel::Push],
        );
        let id = notification.id;
        store.insert(notification);

        let push = Arc::new(ScriptedAdapter::new(
            Channel::Push,
            vec![DeliveryOutcome::Accepted],
        ));
        let engine = engine(store.clone(), vec![push.clone()]);

        engine.deliver(id).await.unwrap();

        let stored = store.get(id);
        assert_eq!(stored.state, NotificationState::Sent);
        let cd = &stored.per_channel[&Channel::Push];
        assert!(cd.dispatched);
        assert_eq!(cd.attempts, 1);
        assert_eq!(push.calls(), 1);
    }

    #[tokio::test]
    async fn delivered_outcome_moves_record_to_delivered() {
        let store = Arc::new(MockStore::default());
        let notification = test_support::notification_for(
            Uuid::new_v4(),
            &[Channel::Socket],
        );
        let id = notification.id;
        store.insert(notification);

        let socket = Arc::new(ScriptedAdapter::new(
            Channel::Socket,
            vec![DeliveryOutcome::Delivered],
        ));
        let engine = engine(store.clone(), vec![socket]);

        engine.deliver(id).await.unwrap();
        assert_eq!(store.get(id).state, NotificationState::Delivered);
    }

    #[tokio::test]
    async fn permanent_failure_on_all_channels_fails_record() {
        let store = Arc::new(MockStore::default());
        let notification = test_support::notification_for(
            Uuid::new_v4(),
            &[Channel::Push, Channel::Email],
        );
        let id = notification.id;
        store.insert(notification);

        let push = Arc::new(ScriptedAdapter::new(
            Channel::Push,
            vec![DeliveryOutcome::Permanent("bad token".into())],
        ));
        let email = Arc::new(ScriptedAdapter::new(
            Channel::Email,
            vec![DeliveryOutcome::Permanent("bounced".into())],
        ));
        let engine = engine(store.clone(), vec![push, email]);

        engine.deliver(id).await.unwrap();
        assert_eq!(store.get(id).state, NotificationState::Failed);
    }

    #[tokio::test]
    async fn transient_failure_waits_out_backoff_before_retry() {
        let store = Arc::new(MockStore::default());
        let notification = test_support::notification_for(
            Uuid::new_v4(),
            &[Channel::Push],
        );
        let id = notification.id;
        store.insert(notification);

        let push = Arc::new(ScriptedAdapter::new(
            Channel::Push,
            vec![
                DeliveryOutcome::Transient("vendor 503".into()),
                DeliveryOutcome::Accepted,
            ],
        ));
        let engine = engine(store.clone(), vec![push.clone()]);

        engine.deliver(id).await.unwrap();
        assert_eq!(store.get(id).state, NotificationState::Pending);
        assert_eq!(push.calls(), 1);

        // Still inside the backoff window: nothing is attempted.
        engine.deliver(id).await.unwrap();
        assert_eq!(push.calls(), 1);

        // After the window, the retry fires and succeeds.
        store.rewind_last_attempt(id, Channel::Push, chrono::Duration::seconds(5));
        engine.deliver(id).await.unwrap();
        assert_eq!(push.calls(), 2);
        assert_eq!(store.get(id).state, NotificationState::Sent);
    }

    #[tokio::test]
    async fn scheduled_record_is_not_dispatched_early() {
        let store = Arc::new(MockStore::default());
        let mut notification = test_support::notification_for(
            Uuid::new_v4(),
            &[Channel::Push],
        );
        notification.scheduled_at = Some(Utc::now() + chrono::Duration::hours(1));
        let id = notification.id;
        store.insert(notification);

        let push = Arc::new(ScriptedAdapter::new(
            Channel::Push,
            vec![DeliveryOutcome::Accepted],
        ));
        let engine = engine(store.clone(), vec![push.clone()]);

        engine.deliver(id).await.unwrap();
        assert_eq!(push.calls(), 0);
        assert_eq!(store.get(id).state, NotificationState::Pending);
    }

    #[tokio::test]
    async fn missing_adapter_is_a_permanent_failure() {
        let store = Arc::new(MockStore::default());
        let notification = test_support::notification_for(
            Uuid::new_v4(),
            &[Channel::Email],
        );
        let id = notification.id;
        store.insert(notification);

        let engine = engine(store.clone(), vec![]);
        engine.deliver(id).await.unwrap();

        let stored = store.get(id);
        assert_eq!(stored.state, NotificationState::Failed);
        assert!(stored.per_channel[&Channel::Email].exhausted);
    }

    #[tokio::test]
    async fn sweep_retries_remaining_channel_after_partial_success() {
        let store = Arc::new(MockStore::default());
        let notification = test_support::notification_for(
            Uuid::new_v4(),
            &[Channel::Push, Channel::Inapp],
        );
        let id = notification.id;
        store.insert(notification);

        let push = Arc::new(ScriptedAdapter::new(
            Channel::Push,
            vec![
                DeliveryOutcome::Transient("vendor 503".into()),
                DeliveryOutcome::Accepted,
            ],
        ));
        let inapp = Arc::new(ScriptedAdapter::new(
            Channel::Inapp,
            vec![DeliveryOutcome::Accepted],
        ));
        let engine = engine(store.clone(), vec![push.clone(), inapp]);

        // In-app succeeds, push fails transiently: the record moves to
        // sent with one channel still owed a retry.
        engine.deliver(id).await.unwrap();
        let stored = store.get(id);
        assert_eq!(stored.state, NotificationState::Sent);
        assert!(!stored.per_channel[&Channel::Push].dispatched);

        // The sweep must still pick the record up once the backoff
        // window has passed.
        store.rewind_last_attempt(id, Channel::Push, chrono::Duration::seconds(5));
        let processed = engine.sweep_once().await.unwrap();
        assert_eq!(processed, 1);
        assert_eq!(push.calls(), 2);
        assert!(store.get(id).per_channel[&Channel::Push].dispatched);
    }

    #[tokio::test]
    async fn sweep_skips_fully_dispatched_records() {
        let store = Arc::new(MockStore::default());
        let notification = test_support::notification_for(Uuid::new_v4(), &[Channel::Push]);
        let id = notification.id;
        store.insert(notification);

        let push = Arc::new(ScriptedAdapter::new(
            Channel::Push,
            vec![DeliveryOutcome::Accepted],
        ));
        let engine = engine(store.clone(), vec![push.clone()]);
        engine.deliver(id).await.unwrap();

        let processed = engine.sweep_once().await.unwrap();
        assert_eq!(processed, 0);
        assert_eq!(push.calls(), 1);
    }

    #[tokio::test]
    async fn sweep_processes_due_records() {
        let store = Arc::new(MockStore::default());
        let a = test_support::notification_for(Uuid::new_v4(), &[Channel::Push]);
        let b = test_support::notification_for(Uuid::new_v4(), &[Channel::Push]);
        store.insert(a);
        store.insert(b);

        let push = Arc::new(ScriptedAdapter::new(
            Channel::Push,
            vec![DeliveryOutcome::Accepted, DeliveryOutcome::Accepted],
        ));
        let engine = engine(store.clone(), vec![push.clone()]);

        let processed = engine.sweep_once().await.unwrap();
        assert_eq!(processed, 2);
        assert_eq!(push.calls(), 2);
    }
}
