//! Shared test fixtures for downstream crate tests.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::notification::channel::{Channel, ChannelDelivery};
use crate::notification::kind::NotificationKind;
use crate::notification::model::Notification;
use crate::notification::priority::NotificationPriority;
use crate::notification::state::NotificationState;

/// A pending notification with push and socket channels requested.
pub fn notification() -> Notification {
    notification_for(Uuid::new_v4(), &[Channel::Push, Channel::Socket])
}

/// A pending notification for a specific recipient and channel set.
pub fn notification_for(recipient_id: Uuid, channels: &[Channel]) -> Notification {
    let now = Utc::now();
    let per_channel: BTreeMap<Channel, ChannelDelivery> = channels
        .iter()
        .map(|c| (*c, ChannelDelivery::enabled()))
        .collect();

    Notification {
        id: Uuid::new_v4(),
        recipient_id,
        producer: recipient_id.to_string(),
        title: "You have a new match".to_string(),
        body: "Someone liked you back".to_string(),
        kind: NotificationKind::Match,
        priority: NotificationPriority::Normal,
        state: NotificationState::Pending,
        read_flag: false,
        read_at: None,
        metadata: None,
        per_channel: Json(per_channel),
        scheduled_at: None,
        expires_at: None,
        idempotency_key: None,
        created_at: now,
        updated_at: now,
    }
}
