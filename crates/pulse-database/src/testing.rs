//! In-memory store double for engine and service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::pagination::{PageRequest, PageResponse};
use pulse_core::types::sorting::SortOrder;
use pulse_entity::notification::model::derive_state;
use pulse_entity::{
    Channel, DeliveryOutcome, KindSummary, NewNotification, Notification, NotificationFilter,
    NotificationKind, NotificationSort, NotificationState,
};

use crate::store::NotificationStore;

/// A `NotificationStore` over a plain in-memory map.
///
/// Mirrors the SQL implementation's semantics closely enough for unit
/// tests: ownership scoping, read idempotency, and outcome folding via
/// `derive_state`.
#[derive(Debug, Default)]
pub struct MockStore {
    records: Mutex<HashMap<Uuid, Notification>>,
}

impl MockStore {
    /// Seed a record directly.
    pub fn insert(&self, notification: Notification) {
        self.records
            .lock()
            .unwrap()
            .insert(notification.id, notification);
    }

    /// Fetch a record, panicking when absent (test convenience).
    pub fn get(&self, id: Uuid) -> Notification {
        self.records.lock().unwrap().get(&id).cloned().unwrap()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    /// Shift a channel's last attempt into the past to make it
    /// retry-eligible without sleeping.
    pub fn rewind_last_attempt(&self, id: Uuid, channel: Channel, by: chrono::Duration) {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(&id).unwrap();
        if let Some(cd) = record.per_channel.0.get_mut(&channel) {
            cd.last_attempt_at = cd.last_attempt_at.map(|t| t - by);
        }
    }
}

fn matches_filter(n: &Notification, filter: &NotificationFilter) -> bool {
    if let Some(kind) = filter.kind {
        if n.kind != kind {
            return false;
        }
    }
    if let Some(read_flag) = filter.read_flag {
        if n.read_flag != read_flag {
            return false;
        }
    }
    if let Some(state) = filter.state {
        if n.state != state {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if n.priority != priority {
            return false;
        }
    }
    if !filter.include_expired && n.is_expired() {
        return false;
    }
    true
}

#[async_trait]
impl NotificationStore for MockStore {
    async fn create(&self, draft: &NewNotification) -> AppResult<Notification> {
        let per_channel = draft.initial_per_channel();
        let state = derive_state(&per_channel, false, u32::MAX);
        let now = Utc::now();
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id: draft.recipient_id,
            producer: draft.producer.clone(),
            title: draft.title.clone(),
            body: draft.body.clone(),
            kind: draft.kind,
            priority: draft.priority,
            state,
            read_flag: false,
            read_at: None,
            metadata: draft.metadata.clone(),
            per_channel: sqlx::types::Json(per_channel),
            scheduled_at: draft.scheduled_at,
            expires_at: draft.expires_at,
            idempotency_key: draft.idempotency_key.clone(),
            created_at: now,
            updated_at: now,
        };
        self.insert(notification.clone());
        Ok(notification)
    }

    async fn find_for_recipient(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> AppResult<Option<Notification>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&id)
            .filter(|n| n.recipient_id == recipient_id && !n.is_expired())
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        producer: &str,
        key: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|n| {
                n.producer == producer
                    && n.idempotency_key.as_deref() == Some(key)
                    && n.created_at >= since
            })
            .cloned())
    }

    async fn list(
        &self,
        recipient_id: Uuid,
        filter: &NotificationFilter,
        sort: NotificationSort,
        order: SortOrder,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let mut items: Vec<Notification> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.recipient_id == recipient_id && matches_filter(n, filter))
            .cloned()
            .collect();

        items.sort_by(|a, b| {
            let ordering = match sort {
                NotificationSort::CreatedAt => a.created_at.cmp(&b.created_at),
                NotificationSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                NotificationSort::Priority => a.priority.cmp(&b.priority),
                NotificationSort::Kind => a.kind.cmp(&b.kind),
            };
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = items.len() as i64;
        let items: Vec<Notification> = items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn count_unread(
        &self,
        recipient_id: Uuid,
        kind: Option<NotificationKind>,
    ) -> AppResult<i64> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|n| {
                n.recipient_id == recipient_id
                    && !n.read_flag
                    && !n.is_expired()
                    && kind.map(|k| n.kind == k).unwrap_or(true)
            })
            .count() as i64)
    }

    async fn group_by_kind(
        &self,
        recipient_id: Uuid,
        include_read: bool,
        limit: i64,
    ) -> AppResult<Vec<KindSummary>> {
        let records = self.records.lock().unwrap();
        let mut groups: HashMap<_, KindSummary> = HashMap::new();
        for n in records.values().filter(|n| {
            n.recipient_id == recipient_id && !n.is_expired() && (include_read || !n.read_flag)
        }) {
            let entry = groups.entry(n.kind).or_insert_with(|| KindSummary {
                kind: n.kind,
                total: 0,
                unread_total: 0,
                latest: n.clone(),
            });
            entry.total += 1;
            if !n.read_flag {
                entry.unread_total += 1;
            }
            if n.created_at > entry.latest.created_at {
                entry.latest = n.clone();
            }
        }
        let mut summaries: Vec<KindSummary> = groups.into_values().collect();
        summaries.sort_by(|a, b| b.latest.created_at.cmp(&a.latest.created_at));
        summaries.truncate(limit.max(0) as usize);
        Ok(summaries)
    }

    async fn update_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
        read_flag: bool,
        max_attempts: u32,
    ) -> AppResult<Option<Notification>> {
        let mut records = self.records.lock().unwrap();
        let Some(n) = records
            .get_mut(&id)
            .filter(|n| n.recipient_id == recipient_id)
        else {
            return Ok(None);
        };
        if read_flag {
            n.read_flag = true;
            n.read_at.get_or_insert_with(Utc::now);
            n.state = NotificationState::Read;
        } else {
            n.read_flag = false;
            n.read_at = None;
            n.state = derive_state(&n.per_channel.0, false, max_attempts);
        }
        n.updated_at = Utc::now();
        Ok(Some(n.clone()))
    }

    async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        kind: Option<NotificationKind>,
    ) -> AppResult<u64> {
        let mut records = self.records.lock().unwrap();
        let mut count = 0;
        for n in records.values_mut().filter(|n| {
            n.recipient_id == recipient_id
                && !n.read_flag
                && kind.map(|k| n.kind == k).unwrap_or(true)
        }) {
            n.read_flag = true;
            n.read_at = Some(Utc::now());
            n.state = NotificationState::Read;
            n.updated_at = Utc::now();
            count += 1;
        }
        Ok(count)
    }

    async fn apply_delivery_outcome(
        &self,
        id: Uuid,
        channel: Channel,
        outcome: &DeliveryOutcome,
        max_attempts: u32,
    ) -> AppResult<Option<Notification>> {
        let mut records = self.records.lock().unwrap();
        let Some(n) = records.get_mut(&id) else {
            return Ok(None);
        };
        let Some(cd) = n.per_channel.0.get_mut(&channel) else {
            return Err(AppError::internal(format!(
                "Channel {channel} was never requested for notification {id}"
            )));
        };
        cd.apply(outcome, Utc::now());
        let next = derive_state(&n.per_channel.0, n.read_flag, max_attempts);
        if n.state.can_transition(next) {
            n.state = next;
        }
        n.updated_at = Utc::now();
        Ok(Some(n.clone()))
    }

    async fn delete(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool> {
        let mut records = self.records.lock().unwrap();
        match records.get(&id) {
            Some(n) if n.recipient_id == recipient_id => {
                records.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
        max_attempts: u32,
    ) -> AppResult<Vec<Notification>> {
        let records = self.records.lock().unwrap();
        let mut due: Vec<Notification> = records
            .values()
            .filter(|n| {
                matches!(
                    n.state,
                    NotificationState::Pending | NotificationState::Sent
                ) && !n.channels_pending_dispatch(max_attempts).is_empty()
                    && n.scheduled_at.map(|s| s <= now).unwrap_or(true)
                    && n.expires_at.map(|e| e > now).unwrap_or(true)
            })
            .cloned()
            .collect();
        due.sort_by_key(|n| n.created_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, n| n.expires_at.map(|e| e >= cutoff).unwrap_or(true));
        Ok((before - records.len()) as u64)
    }
}
