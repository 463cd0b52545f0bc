//! Notification orchestration over the store, cache, delivery engine,
//! and realtime registry.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use pulse_cache::CacheManager;
use pulse_cache::keys;
use pulse_core::config::cache::CacheConfig;
use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::pagination::{PageRequest, PageResponse};
use pulse_core::types::sorting::SortOrder;
use pulse_core::traits::cache::CacheProvider;
use pulse_database::NotificationStore;
use pulse_delivery::DeliveryEngine;
use pulse_entity::notification::model::{MAX_BODY_LEN, MAX_METADATA_BYTES, MAX_TITLE_LEN};
use pulse_entity::{
    Channel, KindSummary, NewNotification, Notification, NotificationFilter, NotificationKind,
    NotificationPriority, NotificationSort,
};
use pulse_realtime::message::types::OutboundFrame;
use pulse_realtime::session::registry::SessionRegistry;

/// How long an idempotency key collapses duplicate creates.
const IDEMPOTENCY_WINDOW_HOURS: i64 = 24;

/// A validated create request as the ingress layer hands it over.
#[derive(Debug, Clone)]
pub struct CreateNotificationParams {
    /// The creating identity (recipient UUID string or system producer).
    pub producer: String,
    /// The recipient user.
    pub recipient_id: Uuid,
    /// Display title.
    pub title: String,
    /// Display body.
    pub body: String,
    /// Category.
    pub kind: NotificationKind,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Opaque payload.
    pub metadata: Option<serde_json::Value>,
    /// Requested delivery channels.
    pub channels: BTreeSet<Channel>,
    /// Deferred firing time.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Soft-expiry time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Idempotency token, unique per producer within the window.
    pub idempotency_key: Option<String>,
}

/// Parameters for a paginated list query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListQuery {
    /// Filter predicate.
    pub filter: NotificationFilter,
    /// Sort column.
    pub sort: NotificationSort,
    /// Sort direction.
    pub order: SortOrder,
    /// Page bounds.
    pub page: PageRequest,
}

/// Most kinds a grouped summary may return.
const MAX_GROUP_LIMIT: i64 = 50;

/// Manages notification creation, queries, and read mutations.
#[derive(Debug, Clone)]
pub struct NotificationService {
    /// Authoritative store.
    store: Arc<dyn NotificationStore>,
    /// Bounded-staleness read cache.
    cache: CacheManager,
    /// Realtime socket registry, for unread-count pushes.
    registry: Arc<SessionRegistry>,
    /// Delivery engine the create path hands records to.
    engine: Arc<DeliveryEngine>,
    /// Per-channel attempt cap, used when re-deriving state.
    max_attempts: u32,
    /// TTL for cached list and grouped reads.
    list_ttl: Duration,
    /// TTL for cached unread counts.
    count_ttl: Duration,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        cache: CacheManager,
        registry: Arc<SessionRegistry>,
        engine: Arc<DeliveryEngine>,
        cache_config: &CacheConfig,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            cache,
            registry,
            engine,
            max_attempts,
            list_ttl: Duration::from_secs(cache_config.list_ttl_seconds),
            count_ttl: Duration::from_secs(cache_config.count_ttl_seconds),
        }
    }

    /// Creates a notification and hands it to the delivery engine.
    ///
    /// Returns the record plus whether it was newly created: a replayed
    /// idempotency key with an identical payload yields the prior
    /// record with `false`, a mismatched payload is a conflict.
    pub async fn create(
        &self,
        params: CreateNotificationParams,
    ) -> AppResult<(Notification, bool)> {
        let draft = validate(params)?;

        if let Some(key) = draft.idempotency_key.as_deref() {
            let since = Utc::now() - chrono::Duration::hours(IDEMPOTENCY_WINDOW_HOURS);
            if let Some(existing) = self
                .store
                .find_by_idempotency_key(&draft.producer, key, since)
                .await?
            {
                if existing.payload_matches(&draft) {
                    info!(id = %existing.id, key, "Idempotent create replayed");
                    return Ok((existing, false));
                }
                return Err(AppError::conflict(format!(
                    "Idempotency key '{key}' was already used with a different payload"
                )));
            }
        }

        let notification = self.store.create(&draft).await?;
        self.invalidate_recipient(notification.recipient_id).await;

        info!(
            id = %notification.id,
            recipient_id = %notification.recipient_id,
            producer = %notification.producer,
            kind = %notification.kind,
            "Notification created"
        );

        self.spawn_delivery(notification.id);
        Ok((notification, true))
    }

    /// Fetches one notification, scoped to its recipient.
    pub async fn get(&self, recipient_id: Uuid, id: Uuid) -> AppResult<Notification> {
        self.store
            .find_for_recipient(id, recipient_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    /// Lists notifications with a bounded-staleness cache in front.
    pub async fn list(
        &self,
        recipient_id: Uuid,
        query: ListQuery,
    ) -> AppResult<PageResponse<Notification>> {
        let key = keys::notification_list(
            recipient_id,
            &query.filter.cache_token(),
            &query.sort.cache_token(query.order),
            query.page.limit(),
            query.page.offset(),
        );
        if let Some(cached) = self.cache_get::<PageResponse<Notification>>(&key).await {
            return Ok(cached);
        }

        let page = self
            .store
            .list(
                recipient_id,
                &query.filter,
                query.sort,
                query.order,
                &query.page,
            )
            .await?;
        self.cache_put(&key, &page, self.list_ttl).await;
        Ok(page)
    }

    /// The recipient's unread count, cached briefly. `kind` narrows the
    /// count to one category.
    pub async fn unread_count(
        &self,
        recipient_id: Uuid,
        kind: Option<NotificationKind>,
    ) -> AppResult<i64> {
        let key = keys::unread_count(recipient_id, kind.map(|k| k.as_str()).unwrap_or("*"));
        if let Some(cached) = self.cache_get::<i64>(&key).await {
            return Ok(cached);
        }

        let count = self.store.count_unread(recipient_id, kind).await?;
        self.cache_put(&key, &count, self.count_ttl).await;
        Ok(count)
    }

    /// Per-kind summaries ordered by most recent activity, cached.
    pub async fn grouped_summary(
        &self,
        recipient_id: Uuid,
        include_read: bool,
        limit: i64,
    ) -> AppResult<Vec<KindSummary>> {
        let limit = limit.clamp(1, MAX_GROUP_LIMIT);
        let options = format!("r{}:l{limit}", if include_read { "1" } else { "0" });
        let key = keys::grouped_summary(recipient_id, &options);
        if let Some(cached) = self.cache_get::<Vec<KindSummary>>(&key).await {
            return Ok(cached);
        }

        let summaries = self
            .store
            .group_by_kind(recipient_id, include_read, limit)
            .await?;
        self.cache_put(&key, &summaries, self.list_ttl).await;
        Ok(summaries)
    }

    /// Sets or clears the read flag. Idempotent; pushes the fresh
    /// unread count to the recipient's live sockets.
    pub async fn update_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
        read_flag: bool,
    ) -> AppResult<Notification> {
        let notification = self
            .store
            .update_read(id, recipient_id, read_flag, self.max_attempts)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;

        self.invalidate_recipient(recipient_id).await;
        self.push_unread_count(recipient_id).await;
        Ok(notification)
    }

    /// Marks every unread notification as read, optionally only one
    /// kind. Returns how many flipped.
    pub async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        kind: Option<NotificationKind>,
    ) -> AppResult<u64> {
        let updated = self.store.mark_all_read(recipient_id, kind).await?;
        if updated > 0 {
            self.invalidate_recipient(recipient_id).await;
            self.push_unread_count(recipient_id).await;
        }
        Ok(updated)
    }

    /// Deletes one notification, scoped to its recipient.
    pub async fn delete(&self, recipient_id: Uuid, id: Uuid) -> AppResult<()> {
        let deleted = self.store.delete(id, recipient_id).await?;
        if !deleted {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        self.invalidate_recipient(recipient_id).await;
        Ok(())
    }

    /// Hand a freshly created record to the delivery engine without
    /// blocking the create path; adapter failures never fail a create.
    fn spawn_delivery(&self, id: Uuid) {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            if let Err(e) = engine.deliver(id).await {
                warn!(%id, error = %e, "Post-create delivery failed");
            }
        });
    }

    /// Drop every cached read for the recipient before a mutation is
    /// acknowledged.
    async fn invalidate_recipient(&self, recipient_id: Uuid) {
        if let Err(e) = self
            .cache
            .delete_pattern(&keys::recipient_pattern(recipient_id))
            .await
        {
            warn!(%recipient_id, error = %e, "Cache invalidation failed");
        }
    }

    /// Push the current unread count to the recipient's live sockets.
    async fn push_unread_count(&self, recipient_id: Uuid) {
        match self.store.count_unread(recipient_id, None).await {
            Ok(count) => {
                self.registry
                    .push_frame(recipient_id, &OutboundFrame::UnreadCount { count });
            }
            Err(e) => warn!(%recipient_id, error = %e, "Unread count push failed"),
        }
    }

    async fn cache_get<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match self.cache.get_json::<T>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    async fn cache_put<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) {
        if let Err(e) = self.cache.set_json(key, value, ttl).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }
}

/// Validate a create request and shape it into a store draft.
fn validate(params: CreateNotificationParams) -> AppResult<NewNotification> {
    let title = params.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation("Title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "Title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    if params.body.chars().count() > MAX_BODY_LEN {
        return Err(AppError::validation(format!(
            "Body exceeds {MAX_BODY_LEN} characters"
        )));
    }
    if params.channels.is_empty() {
        return Err(AppError::validation(
            "At least one delivery channel is required",
        ));
    }
    if let Some(metadata) = &params.metadata {
        let size = serde_json::to_vec(metadata)?.len();
        if size > MAX_METADATA_BYTES {
            return Err(AppError::validation(format!(
                "Metadata exceeds {MAX_METADATA_BYTES} bytes"
            )));
        }
    }
    if let (Some(scheduled), Some(expires)) = (params.scheduled_at, params.expires_at) {
        if expires <= scheduled {
            return Err(AppError::validation(
                "Expiry must be after the scheduled time",
            ));
        }
    }
    if let Some(key) = &params.idempotency_key {
        if key.trim().is_empty() {
            return Err(AppError::validation("Idempotency key must not be blank"));
        }
    }

    Ok(NewNotification {
        recipient_id: params.recipient_id,
        producer: params.producer,
        title,
        body: params.body,
        kind: params.kind,
        priority: params.priority,
        metadata: params.metadata,
        channels: params.channels,
        scheduled_at: params.scheduled_at,
        expires_at: params.expires_at,
        idempotency_key: params.idempotency_key,
    })
}
