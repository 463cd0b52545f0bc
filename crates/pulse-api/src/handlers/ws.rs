//! WebSocket upgrade handler for the live notification socket.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use pulse_realtime::{InboundFrame, OutboundFrame};

use crate::error::ApiError;
use crate::middleware::request_id::RequestId;
use crate::state::AppState;

/// Query parameter for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    pub token: String,
}

/// GET /ws?token={jwt} — WebSocket upgrade
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    rid: RequestId,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    // Authenticate before upgrade so a bad token gets a proper 401
    // instead of a dropped socket.
    let claims = state
        .jwt_decoder
        .decode_token(&query.token)
        .map_err(|e| ApiError::new(e, &rid))?;
    let recipient_id = claims.recipient_id();

    Ok(ws
        .on_upgrade(move |socket| handle_socket(state, recipient_id, socket))
        .into_response())
}

/// Drives one established socket until the client disconnects.
async fn handle_socket(state: AppState, recipient_id: Uuid, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state.registry.register(recipient_id);
    let session_id = handle.id;

    info!(
        session_id = %session_id,
        recipient_id = %recipient_id,
        "Socket session established"
    );

    // Forward registry frames to the client.
    let outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Application-level keepalive.
    let ping_handle = handle.clone();
    let ping_interval = state.config.realtime.ping_interval_seconds;
    let ping_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(ping_interval.max(1)));
        interval.tick().await; // skip the immediate tick
        loop {
            interval.tick().await;
            let frame = OutboundFrame::Ping {
                timestamp: Utc::now().timestamp_millis(),
            };
            let Ok(serialized) = serde_json::to_string(&frame) else {
                break;
            };
            if !ping_handle.is_alive() {
                break;
            }
            ping_handle.send(serialized);
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_inbound(&state, recipient_id, &text).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Socket error");
                break;
            }
        }
    }

    outbound_task.abort();
    ping_task.abort();
    state.registry.unregister(&session_id);

    info!(
        session_id = %session_id,
        recipient_id = %recipient_id,
        "Socket session closed"
    );
}

/// Dispatches one inbound client frame.
async fn handle_inbound(state: &AppState, recipient_id: Uuid, text: &str) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!(recipient_id = %recipient_id, error = %e, "Ignoring malformed inbound frame");
            return;
        }
    };

    match frame {
        InboundFrame::Pong { .. } => {}
        InboundFrame::MarkRead { notification_id } => {
            if let Err(e) = state
                .notifications
                .update_read(recipient_id, notification_id, true)
                .await
            {
                debug!(
                    recipient_id = %recipient_id,
                    notification_id = %notification_id,
                    error = %e,
                    "Socket mark-read failed"
                );
            }
        }
    }
}
