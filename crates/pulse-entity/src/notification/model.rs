//! Notification entity model.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use pulse_core::types::sorting::SortOrder;

use super::channel::{Channel, ChannelDelivery};
use super::kind::NotificationKind;
use super::priority::NotificationPriority;
use super::state::NotificationState;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum body length in characters.
pub const MAX_BODY_LEN: usize = 1000;
/// Maximum serialized metadata size in bytes.
pub const MAX_METADATA_BYTES: usize = 8192;

/// A notification addressed to a single recipient.
///
/// Immutable after creation except for `read_flag`/`read_at`, `state`,
/// `per_channel`, and `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier, assigned at creation, never reused.
    pub id: Uuid,
    /// The recipient user.
    pub recipient_id: Uuid,
    /// The creating identity: the recipient's UUID string for
    /// self-origin, or a system-producer name.
    pub producer: String,
    /// Display title (≤ 200 chars).
    pub title: String,
    /// Display body (≤ 1000 chars).
    pub body: String,
    /// Closed category.
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    /// Priority level.
    #[sqlx(try_from = "String")]
    pub priority: NotificationPriority,
    /// Pipeline state, derived from `per_channel` and `read_flag`.
    #[sqlx(try_from = "String")]
    pub state: NotificationState,
    /// Whether the recipient has read this notification.
    pub read_flag: bool,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
    /// Schemaless payload, opaque to the pipeline.
    pub metadata: Option<serde_json::Value>,
    /// Per-channel delivery bookkeeping. Keys equal the requested
    /// channel set for the lifetime of the record.
    pub per_channel: Json<BTreeMap<Channel, ChannelDelivery>>,
    /// Deferred firing time (NULL = immediate).
    pub scheduled_at: Option<DateTime<Utc>>,
    /// After this instant the record is soft-hidden from reads.
    pub expires_at: Option<DateTime<Utc>>,
    /// Producer-supplied key collapsing duplicate creates.
    pub idempotency_key: Option<String>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Check whether the notification is unread.
    pub fn is_unread(&self) -> bool {
        !self.read_flag
    }

    /// Check whether the notification has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp <= Utc::now()).unwrap_or(false)
    }

    /// The channels requested at creation time.
    pub fn channels_requested(&self) -> BTreeSet<Channel> {
        self.per_channel.keys().copied().collect()
    }

    /// Channels still eligible for a dispatch attempt.
    pub fn channels_pending_dispatch(&self, max_attempts: u32) -> Vec<Channel> {
        Channel::DISPATCH_ORDER
            .into_iter()
            .filter(|c| {
                self.per_channel
                    .get(c)
                    .map(|cd| cd.enabled && !cd.is_terminal(max_attempts))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Whether the same payload was submitted (idempotency replay check).
    pub fn payload_matches(&self, other: &NewNotification) -> bool {
        self.recipient_id == other.recipient_id
            && self.title == other.title
            && self.body == other.body
            && self.kind == other.kind
    }
}

/// Derive the pipeline state from per-channel bookkeeping.
///
/// This is the single source of the §state invariants:
/// - read_flag forces `Read`;
/// - any acknowledged channel yields `Delivered`;
/// - any dispatched channel yields `Sent`;
/// - all enabled channels terminal without a dispatch yields `Failed`;
/// - otherwise the record is still `Pending`.
pub fn derive_state(
    per_channel: &BTreeMap<Channel, ChannelDelivery>,
    read_flag: bool,
    max_attempts: u32,
) -> NotificationState {
    if read_flag {
        return NotificationState::Read;
    }

    let enabled: Vec<&ChannelDelivery> =
        per_channel.values().filter(|cd| cd.enabled).collect();
    if enabled.is_empty() {
        return NotificationState::Failed;
    }

    if enabled.iter().any(|cd| cd.acknowledged) {
        return NotificationState::Delivered;
    }
    if enabled.iter().any(|cd| cd.dispatched) {
        return NotificationState::Sent;
    }
    if enabled.iter().all(|cd| cd.is_terminal(max_attempts)) {
        return NotificationState::Failed;
    }

    NotificationState::Pending
}

/// A validated draft for a notification about to be persisted.
#[derive(Debug, Clone)]
pub struct NewNotification {
    /// The recipient user.
    pub recipient_id: Uuid,
    /// The creating identity.
    pub producer: String,
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
    /// Requested channels. Must be non-empty for deliverable records.
    pub channels: BTreeSet<Channel>,
    /// Deferred firing time.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Soft-expiry time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Idempotency token.
    pub idempotency_key: Option<String>,
}

impl NewNotification {
    /// Build the initial per-channel bookkeeping from the requested set.
    pub fn initial_per_channel(&self) -> BTreeMap<Channel, ChannelDelivery> {
        self.channels
            .iter()
            .map(|c| (*c, ChannelDelivery::enabled()))
            .collect()
    }
}

/// Filter predicate for list/count queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    /// Restrict to one kind.
    pub kind: Option<NotificationKind>,
    /// Restrict by read flag.
    pub read_flag: Option<bool>,
    /// Restrict by state.
    pub state: Option<NotificationState>,
    /// Restrict by priority.
    pub priority: Option<NotificationPriority>,
    /// Include soft-hidden (expired) records.
    pub include_expired: bool,
}

impl NotificationFilter {
    /// Stable token for cache keys; every predicate field participates.
    pub fn cache_token(&self) -> String {
        format!(
            "k{}:r{}:s{}:p{}:x{}",
            self.kind.map(|k| k.as_str()).unwrap_or("*"),
            self.read_flag.map(|r| if r { "1" } else { "0" }).unwrap_or("*"),
            self.state.map(|s| s.as_str()).unwrap_or("*"),
            self.priority.map(|p| p.as_str()).unwrap_or("*"),
            if self.include_expired { "1" } else { "0" },
        )
    }
}

/// Sortable columns for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Priority,
    Kind,
}

impl NotificationSort {
    /// The backing column name.
    pub fn as_column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Priority => "priority",
            Self::Kind => "kind",
        }
    }

    /// Stable token for cache keys.
    pub fn cache_token(&self, order: SortOrder) -> String {
        format!("{}.{}", self.as_column(), order.as_sql().to_lowercase())
    }
}

/// One row of the grouped-by-kind summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindSummary {
    /// The kind this group covers.
    pub kind: NotificationKind,
    /// Total records of this kind for the recipient.
    pub total: i64,
    /// Unread records of this kind.
    pub unread_total: i64,
    /// The most recent record of this kind.
    pub latest: Notification,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channel::DeliveryOutcome;

    fn two_channel_map() -> BTreeMap<Channel, ChannelDelivery> {
        BTreeMap::from([
            (Channel::Push, ChannelDelivery::enabled()),
            (Channel::Email, ChannelDelivery::enabled()),
        ])
    }

    #[test]
    fn fresh_record_is_pending() {
        let map = two_channel_map();
        assert_eq!(derive_state(&map, false, 5), NotificationState::Pending);
    }

    #[test]
    fn read_flag_wins_over_everything() {
        let map = two_channel_map();
        assert_eq!(derive_state(&map, true, 5), NotificationState::Read);
    }

    #[test]
    fn one_accepted_channel_means_sent() {
        let mut map = two_channel_map();
        map.get_mut(&Channel::Push)
            .unwrap()
            .apply(&DeliveryOutcome::Permanent("gone".into()), Utc::now());
        map.get_mut(&Channel::Email)
            .unwrap()
            .apply(&DeliveryOutcome::Accepted, Utc::now());
        assert_eq!(derive_state(&map, false, 5), NotificationState::Sent);
    }

    #[test]
    fn acknowledged_channel_means_delivered() {
        let mut map = two_channel_map();
        map.get_mut(&Channel::Push)
            .unwrap()
            .apply(&DeliveryOutcome::Delivered, Utc::now());
        assert_eq!(derive_state(&map, false, 5), NotificationState::Delivered);
    }

    #[test]
    fn all_channels_exhausted_means_failed() {
        let mut map = two_channel_map();
        for cd in map.values_mut() {
            cd.apply(&DeliveryOutcome::Permanent("rejected".into()), Utc::now());
        }
        assert_eq!(derive_state(&map, false, 5), NotificationState::Failed);
    }

    #[test]
    fn empty_channel_set_means_failed() {
        let map = BTreeMap::new();
        assert_eq!(derive_state(&map, false, 5), NotificationState::Failed);
    }

    #[test]
    fn transient_failures_stay_pending_until_cap() {
        let mut map = two_channel_map();
        for cd in map.values_mut() {
            for _ in 0..3 {
                cd.apply(&DeliveryOutcome::Transient("timeout".into()), Utc::now());
            }
        }
        assert_eq!(derive_state(&map, false, 5), NotificationState::Pending);
        for cd in map.values_mut() {
            for _ in 0..2 {
                cd.apply(&DeliveryOutcome::Transient("timeout".into()), Utc::now());
            }
        }
        assert_eq!(derive_state(&map, false, 5), NotificationState::Failed);
    }

    #[test]
    fn filter_token_is_stable_and_distinct() {
        let all = NotificationFilter::default();
        let unread = NotificationFilter {
            read_flag: Some(false),
            ..Default::default()
        };
        assert_eq!(all.cache_token(), all.cache_token());
        assert_ne!(all.cache_token(), unread.cache_token());
    }
}
