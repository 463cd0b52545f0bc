//! Inbound and outbound socket frame type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pulse_entity::Notification;

/// Frames sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        timestamp: i64,
    },
    /// Mark a notification as read from the socket.
    MarkRead {
        /// Notification ID.
        notification_id: Uuid,
    },
}

/// The notification payload carried by a fan-out frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Notification ID.
    pub id: Uuid,
    /// Category.
    pub kind: String,
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
    /// Priority level.
    pub priority: String,
    /// Opaque payload.
    pub metadata: Option<serde_json::Value>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

/// Frames sent by the server to the client.
///
/// Fan-out frames are `{"event": "notification", "record": {...}}` on
/// the wire; clients key off the `event` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// A notification pushed over the live socket.
    Notification {
        /// The notification record.
        record: NotificationRecord,
    },
    /// Updated unread count after a read/read-all mutation.
    UnreadCount {
        /// Current unread total.
        count: i64,
    },
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp.
        timestamp: i64,
    },
    /// Error frame.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundFrame {
    /// Build a notification frame from the entity record.
    pub fn from_notification(notification: &Notification) -> Self {
        Self::Notification {
            record: NotificationRecord {
                id: notification.id,
                kind: notification.kind.to_string(),
                title: notification.title.clone(),
                body: notification.body.clone(),
                priority: notification.priority.to_string(),
                metadata: notification.metadata.clone(),
                created_at: notification.created_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_frames_tag_with_snake_case_event() {
        let frame = OutboundFrame::UnreadCount { count: 3 };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["event"], "unread_count");
        assert_eq!(json["count"], 3);
    }

    #[test]
    fn fan_out_frame_nests_the_record() {
        let notification = pulse_entity::test_support::notification_for(
            Uuid::new_v4(),
            &[pulse_entity::Channel::Socket],
        );
        let json =
            serde_json::to_value(OutboundFrame::from_notification(&notification)).unwrap();

        assert_eq!(json["event"], "notification");
        assert_eq!(json["record"]["id"], notification.id.to_string());
        assert_eq!(json["record"]["title"], notification.title);
        assert!(json["record"]["created_at"].is_string());
    }

    #[test]
    fn inbound_mark_read_parses() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"type":"mark_read","notification_id":"{id}"}}"#);
        let frame: InboundFrame = serde_json::from_str(&raw).unwrap();
        assert!(matches!(frame, InboundFrame::MarkRead { notification_id } if notification_id == id));
    }
}
