//! Session registry — tracks all live socket sessions indexed by recipient.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use pulse_core::config::realtime::RealtimeConfig;
use pulse_entity::Notification;

use crate::message::types::OutboundFrame;

use super::handle::{SessionHandle, SessionId};

/// Thread-safe registry of all live socket sessions on this node.
#[derive(Debug)]
pub struct SessionRegistry {
    /// Recipient ID → sessions (one recipient can hold several tabs).
    by_recipient: DashMap<Uuid, Vec<Arc<SessionHandle>>>,
    /// Session ID → handle for direct lookup.
    by_id: DashMap<SessionId, Arc<SessionHandle>>,
    /// Configuration.
    config: RealtimeConfig,
}

impl SessionRegistry {
    /// Creates a new empty registry.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            by_recipient: DashMap::new(),
            by_id: DashMap::new(),
            config,
        }
    }

    /// Registers a new authenticated session.
    ///
    /// Returns the session handle and the receiver the socket task
    /// drains into the sink. A recipient at their session cap has their
    /// oldest session evicted.
    pub fn register(&self, recipient_id: Uuid) -> (Arc<SessionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.session_buffer_size);
        let handle = Arc::new(SessionHandle::new(recipient_id, tx));

        let existing = self.recipient_sessions(recipient_id);
        if existing.len() >= self.config.max_sessions_per_recipient {
            warn!(
                %recipient_id,
                count = existing.len(),
                max = self.config.max_sessions_per_recipient,
                "Recipient at max sessions, evicting oldest"
            );
            if let Some(oldest) = existing.first() {
                oldest.mark_dead();
                self.unregister(&oldest.id);
            }
        }

        self.by_id.insert(handle.id, handle.clone());
        self.by_recipient
            .entry(recipient_id)
            .or_default()
            .push(handle.clone());

        info!(session_id = %handle.id, %recipient_id, "Socket session registered");
        (handle, rx)
    }

    /// Unregisters a session.
    pub fn unregister(&self, session_id: &SessionId) -> Option<Arc<SessionHandle>> {
        let (_, handle) = self.by_id.remove(session_id)?;
        handle.mark_dead();
        if let Some(mut sessions) = self.by_recipient.get_mut(&handle.recipient_id) {
            sessions.retain(|s| s.id != *session_id);
            if sessions.is_empty() {
                drop(sessions);
                self.by_recipient.remove(&handle.recipient_id);
            }
        }
        info!(%session_id, recipient_id = %handle.recipient_id, "Socket session unregistered");
        Some(handle)
    }

    /// All live sessions for a recipient.
    pub fn recipient_sessions(&self, recipient_id: Uuid) -> Vec<Arc<SessionHandle>> {
        self.by_recipient
            .get(&recipient_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Whether a recipient has at least one live session on this node.
    pub fn is_connected(&self, recipient_id: Uuid) -> bool {
        !self.recipient_sessions(recipient_id).is_empty()
    }

    /// Push a notification frame to every live session of its recipient.
    ///
    /// Returns the number of sessions that accepted the frame. Sessions
    /// whose channel is closed are pruned on the spot.
    pub fn push_notification(&self, notification: &Notification) -> usize {
        let frame = OutboundFrame::from_notification(notification);
        self.push_frame(notification.recipient_id, &frame)
    }

    /// Push an arbitrary frame to every live session of a recipient.
    pub fn push_frame(&self, recipient_id: Uuid, frame: &OutboundFrame) -> usize {
        let serialized = match serde_json::to_string(frame) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound frame");
                return 0;
            }
        };

        let sessions = self.recipient_sessions(recipient_id);
        let mut accepted = 0;
        for session in &sessions {
            if session.send(serialized.clone()) {
                accepted += 1;
            } else if !session.is_alive() {
                self.unregister(&session.id);
            }
        }
        accepted
    }

    /// Total live sessions on this node.
    pub fn session_count(&self) -> usize {
        self.by_id.len()
    }

    /// Unique connected recipients on this node.
    pub fn recipient_count(&self) -> usize {
        self.by_recipient.len()
    }

    /// Drop every session (used during shutdown).
    pub fn close_all(&self) {
        let ids: Vec<SessionId> = self.by_id.iter().map(|entry| *entry.key()).collect();
        for id in &ids {
            self.unregister(id);
        }
        info!(count = ids.len(), "All socket sessions closed");
    }
}
