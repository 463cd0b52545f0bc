//! Live socket channel adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use pulse_entity::{Channel, DeliveryOutcome, Notification};
use pulse_realtime::SessionRegistry;

use crate::adapter::ChannelAdapter;

/// Pushes notifications over live socket sessions.
///
/// Reaching at least one live session counts as confirmed delivery;
/// a recipient with no sessions on this node gets a transient failure
/// so the engine retries while they may reconnect.
#[derive(Debug, Clone)]
pub struct SocketAdapter {
    registry: Arc<SessionRegistry>,
}

impl SocketAdapter {
    /// Build the adapter over the node's session registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ChannelAdapter for SocketAdapter {
    fn channel(&self) -> Channel {
        Channel::Socket
    }

    async fn dispatch(&self, notification: &Notification) -> DeliveryOutcome {
        let accepted = self.registry.push_notification(notification);
        if accepted > 0 {
            debug!(id = %notification.id, sessions = accepted, "Socket dispatch delivered");
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::Transient("No live socket session".to_string())
        }
    }
}
