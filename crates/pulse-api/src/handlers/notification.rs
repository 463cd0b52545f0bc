//! Notification REST handlers.
//!
//! Every handler authenticates via an extractor, delegates to the
//! notification service, and wraps the result in the standard
//! envelope. Ownership failures surface as 404 so callers cannot
//! probe for other users' notification ids.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use pulse_entity::NotificationKind;

use crate::dto::request::{
    CreateNotificationRequest, GroupedParams, KindParam, ListParams, MarkReadRequest,
    SystemCreateNotificationRequest,
};
use crate::dto::response::{
    CountData, Envelope, GroupedData, MarkAllReadData, NotificationListData, NotificationResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthRecipient, SystemProducer};
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

/// `GET /api/notifications`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Query(params): Query<ListParams>,
) -> Result<Json<Envelope<NotificationListData>>, ApiError> {
    let query = params.into_query().map_err(|e| ApiError::new(e, &rid))?;
    let page = state
        .notifications
        .list(auth.recipient_id, query)
        .await
        .map_err(|e| ApiError::new(e, &rid))?;
    Ok(Json(Envelope::ok("Notifications retrieved", page.into(), &rid.0)))
}

/// `GET /api/notifications/unread-count`
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Query(params): Query<KindParam>,
) -> Result<Json<Envelope<CountData>>, ApiError> {
    let kind = params.parse_kind().map_err(|e| ApiError::new(e, &rid))?;
    let count = state
        .notifications
        .unread_count(auth.recipient_id, kind)
        .await
        .map_err(|e| ApiError::new(e, &rid))?;
    Ok(Json(Envelope::ok(
        "Unread count retrieved",
        CountData { count },
        &rid.0,
    )))
}

/// `GET /api/notifications/grouped`
pub async fn grouped(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Query(params): Query<GroupedParams>,
) -> Result<Json<Envelope<GroupedData>>, ApiError> {
    let groups = state
        .notifications
        .grouped_summary(
            auth.recipient_id,
            params.include_read,
            params.limit.unwrap_or(20),
        )
        .await
        .map_err(|e| ApiError::new(e, &rid))?;
    let data = GroupedData {
        groups: groups.into_iter().map(Into::into).collect(),
    };
    Ok(Json(Envelope::ok("Grouped notifications retrieved", data, &rid.0)))
}

/// `GET /api/notifications/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<NotificationResponse>>, ApiError> {
    let notification = state
        .notifications
        .get(auth.recipient_id, id)
        .await
        .map_err(|e| ApiError::new(e, &rid))?;
    Ok(Json(Envelope::ok(
        "Notification retrieved",
        notification.into(),
        &rid.0,
    )))
}

/// `GET /api/notifications/types/{type}`
pub async fn list_by_kind(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Path(kind): Path<String>,
    Query(mut params): Query<ListParams>,
) -> Result<Json<Envelope<NotificationListData>>, ApiError> {
    // The path segment wins over any `type` query parameter.
    kind.parse::<NotificationKind>()
        .map_err(|e| ApiError::new(e, &rid))?;
    params.kind = Some(kind);

    let query = params.into_query().map_err(|e| ApiError::new(e, &rid))?;
    let page = state
        .notifications
        .list(auth.recipient_id, query)
        .await
        .map_err(|e| ApiError::new(e, &rid))?;
    Ok(Json(Envelope::ok("Notifications retrieved", page.into(), &rid.0)))
}

/// `POST /api/notifications`
///
/// A bearer-authenticated user creates a notification for themselves.
/// Replaying an idempotency key returns the original record with 200
/// instead of 201.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Json(body): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Envelope<NotificationResponse>>), ApiError> {
    let params = body
        .into_params(auth.recipient_id.to_string(), auth.recipient_id)
        .map_err(|e| ApiError::new(e, &rid))?;
    created_response(&state, params, &rid).await
}

/// `POST /api/system/notifications`
///
/// A trusted backend creates a notification for any user, authenticated
/// by API key.
pub async fn system_create(
    State(state): State<AppState>,
    producer: SystemProducer,
    rid: RequestId,
    Json(body): Json<SystemCreateNotificationRequest>,
) -> Result<(StatusCode, Json<Envelope<NotificationResponse>>), ApiError> {
    let recipient_id = body.user_id;
    let params = body
        .body
        .into_params(producer.producer, recipient_id)
        .map_err(|e| ApiError::new(e, &rid))?;
    created_response(&state, params, &rid).await
}

async fn created_response(
    state: &AppState,
    params: pulse_service::CreateNotificationParams,
    rid: &RequestId,
) -> Result<(StatusCode, Json<Envelope<NotificationResponse>>), ApiError> {
    let (notification, created) = state
        .notifications
        .create(params)
        .await
        .map_err(|e| ApiError::new(e, rid))?;

    let (status, message) = if created {
        (StatusCode::CREATED, "Notification created")
    } else {
        (StatusCode::OK, "Notification already exists")
    };
    Ok((
        status,
        Json(Envelope::ok(message, notification.into(), &rid.0)),
    ))
}

/// `PATCH /api/notifications/{id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Path(id): Path<Uuid>,
    Json(body): Json<MarkReadRequest>,
) -> Result<Json<Envelope<NotificationResponse>>, ApiError> {
    let notification = state
        .notifications
        .update_read(auth.recipient_id, id, body.read)
        .await
        .map_err(|e| ApiError::new(e, &rid))?;
    let message = if body.read {
        "Notification marked as read"
    } else {
        "Notification marked as unread"
    };
    Ok(Json(Envelope::ok(message, notification.into(), &rid.0)))
}

/// `PATCH /api/notifications/mark-all-read`
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Query(params): Query<KindParam>,
) -> Result<Json<Envelope<MarkAllReadData>>, ApiError> {
    let kind = params.parse_kind().map_err(|e| ApiError::new(e, &rid))?;
    let updated = state
        .notifications
        .mark_all_read(auth.recipient_id, kind)
        .await
        .map_err(|e| ApiError::new(e, &rid))?;
    Ok(Json(Envelope::ok(
        "All notifications marked as read",
        MarkAllReadData { updated },
        &rid.0,
    )))
}

/// `DELETE /api/notifications/{id}`
pub async fn delete_one(
    State(state): State<AppState>,
    auth: AuthRecipient,
    rid: RequestId,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<()>>, ApiError> {
    state
        .notifications
        .delete(auth.recipient_id, id)
        .await
        .map_err(|e| ApiError::new(e, &rid))?;
    Ok(Json(Envelope {
        success: true,
        message: "Notification deleted".to_string(),
        data: None,
        code: None,
        retry_after: None,
        request_id: rid.0,
        timestamp: chrono::Utc::now(),
    }))
}
