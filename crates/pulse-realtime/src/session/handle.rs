//! Individual socket session handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique session identifier.
pub type SessionId = Uuid;

/// A handle to a single live socket session.
///
/// Holds the bounded sender for pushing frames to the client plus
/// metadata about the connected recipient. The socket task owns the
/// receiving end and the actual sink.
#[derive(Debug)]
pub struct SessionHandle {
    /// Unique session ID.
    pub id: SessionId,
    /// Recipient who owns this session.
    pub recipient_id: Uuid,
    /// Sender for serialized outbound frames.
    pub sender: mpsc::Sender<String>,
    /// When the session was established.
    pub connected_at: DateTime<Utc>,
    /// Whether the session is still alive.
    alive: AtomicBool,
}

impl SessionHandle {
    /// Create a new session handle.
    pub fn new(recipient_id: Uuid, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// Push a serialized frame to this session without blocking.
    ///
    /// A full buffer drops the frame (the client is too slow; it will
    /// recover via the pull API). A closed channel marks the session
    /// dead so the registry can prune it.
    pub fn send(&self, frame: String) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session_id = %self.id, "Session send buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if the session is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the session as dead.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
