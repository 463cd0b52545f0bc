//! Request DTOs with validation and closed-enum parsing.
//!
//! Enum-valued fields arrive as strings and are parsed explicitly so
//! unknown values produce a field-level 400 instead of a generic
//! deserialization error.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::pagination::PageRequest;
use pulse_core::types::sorting::SortOrder;
use pulse_entity::{
    Channel, NotificationFilter, NotificationKind, NotificationPriority, NotificationSort,
    NotificationState,
};
use pulse_service::{CreateNotificationParams, ListQuery};

/// Channels used when a create request does not name any.
const DEFAULT_CHANNELS: [Channel; 3] = [Channel::Push, Channel::Inapp, Channel::Socket];

/// Body of `POST /api/notifications`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    /// Display title.
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    /// Display body.
    #[serde(default)]
    #[validate(length(max = 1000, message = "must be at most 1000 characters"))]
    pub message: String,
    /// Category (closed enumeration, kebab-case).
    #[serde(rename = "type")]
    pub kind: String,
    /// Priority; defaults to normal.
    pub priority: Option<String>,
    /// Delivery channels; defaults to push + inapp + socket.
    pub channels: Option<Vec<String>>,
    /// Opaque payload.
    pub metadata: Option<serde_json::Value>,
    /// Deferred firing time.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Soft-expiry time.
    pub expires_at: Option<DateTime<Utc>>,
    /// Producer idempotency token.
    pub idempotency_key: Option<String>,
}

impl CreateNotificationRequest {
    /// Turn the wire request into validated service parameters.
    pub fn into_params(
        self,
        producer: String,
        recipient_id: Uuid,
    ) -> AppResult<CreateNotificationParams> {
        self.validate().map_err(describe_validation_errors)?;

        let kind: NotificationKind = self.kind.parse()?;
        let priority = match self.priority.as_deref() {
            Some(p) => p.parse()?,
            None => NotificationPriority::Normal,
        };
        let channels: BTreeSet<Channel> = match &self.channels {
            Some(list) if !list.is_empty() => list
                .iter()
                .map(|c| c.parse())
                .collect::<AppResult<BTreeSet<Channel>>>()?,
            _ => DEFAULT_CHANNELS.into_iter().collect(),
        };

        Ok(CreateNotificationParams {
            producer,
            recipient_id,
            title: self.title,
            body: self.message,
            kind,
            priority,
            metadata: self.metadata,
            channels,
            scheduled_at: self.scheduled_at,
            expires_at: self.expires_at,
            idempotency_key: self.idempotency_key,
        })
    }
}

/// Body of `POST /api/system/notifications`; the recipient is mandatory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemCreateNotificationRequest {
    /// Recipient of the notification.
    pub user_id: Uuid,
    /// The common create payload.
    #[serde(flatten)]
    pub body: CreateNotificationRequest,
}

/// Query string of `GET /api/notifications`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Restrict to one kind.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Restrict by read flag.
    pub read: Option<bool>,
    /// Restrict by pipeline state.
    pub status: Option<String>,
    /// Restrict by priority.
    pub priority: Option<String>,
    /// Page size, clamped to [1, 100].
    pub limit: Option<i64>,
    /// Row offset.
    pub offset: Option<i64>,
    /// Sort column: created_at, updated_at, priority, kind.
    pub sort: Option<String>,
    /// Sort direction: asc or desc.
    pub order: Option<String>,
}

impl ListParams {
    /// Parse enum fields and build the service-level query.
    pub fn into_query(self) -> AppResult<ListQuery> {
        let filter = NotificationFilter {
            kind: self.kind.as_deref().map(str::parse).transpose()?,
            read_flag: self.read,
            state: self
                .status
                .as_deref()
                .map(str::parse::<NotificationState>)
                .transpose()?,
            priority: self
                .priority
                .as_deref()
                .map(str::parse::<NotificationPriority>)
                .transpose()?,
            include_expired: false,
        };

        let sort = match self.sort.as_deref() {
            None | Some("created_at") => NotificationSort::CreatedAt,
            Some("updated_at") => NotificationSort::UpdatedAt,
            Some("priority") => NotificationSort::Priority,
            Some("kind") | Some("type") => NotificationSort::Kind,
            Some(other) => {
                return Err(AppError::validation(format!("Unknown sort column: '{other}'")));
            }
        };
        let order = match self.order.as_deref() {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(other) => {
                return Err(AppError::validation(format!("Unknown sort order: '{other}'")));
            }
        };

        Ok(ListQuery {
            filter,
            sort,
            order,
            page: PageRequest::new(self.limit.unwrap_or(20), self.offset.unwrap_or(0)),
        })
    }
}

/// Query string of `GET /api/notifications/unread-count` and
/// `PATCH /api/notifications/mark-all-read`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KindParam {
    /// Restrict to one kind.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl KindParam {
    /// Parse the optional kind.
    pub fn parse_kind(&self) -> AppResult<Option<NotificationKind>> {
        self.kind.as_deref().map(str::parse).transpose()
    }
}

/// Query string of `GET /api/notifications/grouped`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedParams {
    /// Count read records too (default: unread only).
    #[serde(default)]
    pub include_read: bool,
    /// Most kinds to return, clamped to [1, 50].
    pub limit: Option<i64>,
}

impl Default for GroupedParams {
    fn default() -> Self {
        Self {
            include_read: false,
            limit: None,
        }
    }
}

/// Body of `PATCH /api/notifications/:id/read`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MarkReadRequest {
    /// Target read flag.
    pub read: bool,
}

/// Flatten validator output into one field-level message.
fn describe_validation_errors(errors: ValidationErrors) -> AppError {
    let detail: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{field} {message}")
            })
        })
        .collect();
    AppError::validation(detail.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(json: serde_json::Value) -> CreateNotificationRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn create_parses_wire_names() {
        let request = create_request(serde_json::json!({
            "title": "T",
            "message": "M",
            "type": "like",
            "idempotencyKey": "evt-1"
        }));
        let params = request
            .into_params("producer".into(), Uuid::new_v4())
            .unwrap();
        assert_eq!(params.kind, NotificationKind::Like);
        assert_eq!(params.body, "M");
        assert_eq!(params.idempotency_key.as_deref(), Some("evt-1"));
        assert_eq!(
            params.channels,
            DEFAULT_CHANNELS.into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn create_rejects_unknown_kind() {
        let request = create_request(serde_json::json!({
            "title": "T",
            "message": "M",
            "type": "carrier-pigeon"
        }));
        let err = request
            .into_params("producer".into(), Uuid::new_v4())
            .unwrap_err();
        assert_eq!(err.kind, pulse_core::error::ErrorKind::Validation);
    }

    #[test]
    fn create_rejects_over_length_title() {
        let request = create_request(serde_json::json!({
            "title": "x".repeat(201),
            "message": "M",
            "type": "like"
        }));
        assert!(
            request
                .into_params("producer".into(), Uuid::new_v4())
                .is_err()
        );
    }

    #[test]
    fn system_create_flattens_common_payload() {
        let request: SystemCreateNotificationRequest = serde_json::from_value(serde_json::json!({
            "userId": Uuid::new_v4(),
            "title": "T",
            "message": "M",
            "type": "match"
        }))
        .unwrap();
        assert_eq!(request.body.kind, "match");
    }

    #[test]
    fn list_params_build_a_filtered_query() {
        let params = ListParams {
            kind: Some("like".into()),
            read: Some(false),
            sort: Some("priority".into()),
            order: Some("asc".into()),
            limit: Some(500),
            ..Default::default()
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.filter.kind, Some(NotificationKind::Like));
        assert_eq!(query.filter.read_flag, Some(false));
        assert_eq!(query.sort, NotificationSort::Priority);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.page.limit(), 100);
    }

    #[test]
    fn list_params_reject_unknown_status() {
        let params = ListParams {
            status: Some("vanished".into()),
            ..Default::default()
        };
        assert!(params.into_query().is_err());
    }
}
