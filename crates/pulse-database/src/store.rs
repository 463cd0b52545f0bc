//! The persistence seam for notifications.
//!
//! The service and delivery layers depend on this trait rather than a
//! concrete repository, which keeps the delivery engine testable against
//! an in-memory double.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use pulse_core::result::AppResult;
use pulse_core::types::pagination::{PageRequest, PageResponse};
use pulse_core::types::sorting::SortOrder;
use pulse_entity::{
    Channel, DeliveryOutcome, KindSummary, NewNotification, Notification, NotificationFilter,
    NotificationKind, NotificationSort,
};

/// Authoritative storage for notification records.
///
/// All recipient-facing reads and mutations are scoped by `recipient_id`;
/// a row owned by someone else behaves exactly like a missing row.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    /// Persist a new notification in its initial state.
    async fn create(&self, draft: &NewNotification) -> AppResult<Notification>;

    /// Fetch one notification owned by `recipient_id`.
    async fn find_for_recipient(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> AppResult<Option<Notification>>;

    /// Fetch one notification without ownership scoping (engine use only).
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// Look up a prior create with the same producer and idempotency key
    /// inside the dedup window.
    async fn find_by_idempotency_key(
        &self,
        producer: &str,
        key: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Option<Notification>>;

    /// List a recipient's notifications, newest first by default.
    async fn list(
        &self,
        recipient_id: Uuid,
        filter: &NotificationFilter,
        sort: NotificationSort,
        order: SortOrder,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Count a recipient's unread, unexpired notifications, optionally
    /// restricted to one kind.
    async fn count_unread(
        &self,
        recipient_id: Uuid,
        kind: Option<NotificationKind>,
    ) -> AppResult<i64>;

    /// Per-kind totals with the latest record of each kind, ordered by
    /// latest record, at most `limit` kinds. `include_read` widens the
    /// counts from unread-only to all records.
    async fn group_by_kind(
        &self,
        recipient_id: Uuid,
        include_read: bool,
        limit: i64,
    ) -> AppResult<Vec<KindSummary>>;

    /// Set or clear the read flag. Atomic; `read_at` is set on
    /// false→true and cleared on true→false, and the pipeline state is
    /// re-derived when a record is marked unread again.
    async fn update_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
        read_flag: bool,
        max_attempts: u32,
    ) -> AppResult<Option<Notification>>;

    /// Mark every unread notification read, optionally restricted to
    /// one kind. Returns the number of rows that actually transitioned.
    async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        kind: Option<NotificationKind>,
    ) -> AppResult<u64>;

    /// Atomically fold one dispatch outcome into a notification's
    /// per-channel bookkeeping and re-derive its state.
    async fn apply_delivery_outcome(
        &self,
        id: Uuid,
        channel: Channel,
        outcome: &DeliveryOutcome,
        max_attempts: u32,
    ) -> AppResult<Option<Notification>>;

    /// Delete one notification. Returns false when nothing matched.
    async fn delete(&self, id: Uuid, recipient_id: Uuid) -> AppResult<bool>;

    /// Notifications whose scheduled time has arrived and which still
    /// have deliverable channels. Covers both fresh `pending` records
    /// and `sent` records where one channel succeeded while another is
    /// still retrying.
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
        max_attempts: u32,
    ) -> AppResult<Vec<Notification>>;

    /// Hard-delete records expired for longer than the retention grace.
    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
