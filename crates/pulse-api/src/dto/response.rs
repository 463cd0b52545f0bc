//! Response DTOs and the standard envelope.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use pulse_core::types::pagination::PageResponse;
use pulse_delivery::MetricsSnapshot;
use pulse_entity::{
    Channel, ChannelDelivery, KindSummary, Notification, NotificationKind, NotificationPriority,
    NotificationState,
};

/// The response envelope wrapping every JSON body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Payload, absent on errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable error code, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Retry hint in seconds, present only on rate-limit errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    /// Request correlation id.
    pub request_id: String,
    /// Server time the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> Envelope<T> {
    /// A successful envelope.
    pub fn ok(message: impl Into<String>, data: T, request_id: &str) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            code: None,
            retry_after: None,
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// An error envelope.
    pub fn error(message: impl Into<String>, code: &str, request_id: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            code: Some(code.to_string()),
            retry_after: None,
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// A notification record as the API presents it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub producer: String,
    pub title: String,
    /// The display body ("message" on the wire).
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub state: NotificationState,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub per_channel: BTreeMap<Channel, ChannelDelivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            recipient_id: n.recipient_id,
            producer: n.producer,
            title: n.title,
            message: n.body,
            kind: n.kind,
            priority: n.priority,
            state: n.state,
            read: n.read_flag,
            read_at: n.read_at,
            metadata: n.metadata,
            per_channel: n.per_channel.0,
            scheduled_at: n.scheduled_at,
            expires_at: n.expires_at,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

/// Paging metadata attached to list payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

/// Payload of the list endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListData {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: PaginationMeta,
}

impl From<PageResponse<Notification>> for NotificationListData {
    fn from(page: PageResponse<Notification>) -> Self {
        let pagination = PaginationMeta {
            total: page.total,
            limit: page.limit,
            offset: page.offset,
            has_more: page.has_more,
        };
        Self {
            notifications: page.items.into_iter().map(Into::into).collect(),
            pagination,
        }
    }
}

/// Payload of the unread-count endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CountData {
    pub count: i64,
}

/// One group of the grouped-summary payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindGroupResponse {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub count: i64,
    pub unread_count: i64,
    pub latest: NotificationResponse,
}

impl From<KindSummary> for KindGroupResponse {
    fn from(summary: KindSummary) -> Self {
        Self {
            kind: summary.kind,
            count: summary.total,
            unread_count: summary.unread_total,
            latest: summary.latest.into(),
        }
    }
}

/// Payload of the grouped-summary endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GroupedData {
    pub groups: Vec<KindGroupResponse>,
}

/// Payload of the mark-all-read endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarkAllReadData {
    pub updated: u64,
}

/// Liveness payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Dependency-probing health payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthData {
    pub status: String,
    pub database: String,
    pub cache: String,
    pub socket_sessions: usize,
    pub connected_recipients: usize,
    pub delivery: MetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_camel_case() {
        let envelope = Envelope::ok("Created", CountData { count: 1 }, "req-1");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["requestId"], "req-1");
        assert_eq!(json["data"]["count"], 1);
        assert!(json.get("code").is_none());
    }

    #[test]
    fn error_envelope_carries_code_without_data() {
        let envelope = Envelope::<()>::error("Nope", "NOT_FOUND", "req-2");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn notification_uses_wire_field_names() {
        let n = pulse_entity::test_support::notification_for(Uuid::new_v4(), &[Channel::Push]);
        let json = serde_json::to_value(NotificationResponse::from(n)).unwrap();
        assert!(json.get("type").is_some());
        assert!(json.get("message").is_some());
        assert!(json.get("perChannel").is_some());
        assert!(json.get("kind").is_none());
        assert!(json.get("body").is_none());
    }
}
