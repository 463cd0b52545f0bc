//! In-app channel adapter.

use async_trait::async_trait;

use pulse_entity::{Channel, DeliveryOutcome, Notification};

use crate::adapter::ChannelAdapter;

/// The in-app channel: the persisted record itself is the delivery.
///
/// By the time the engine dispatches, the record is already visible to
/// the pull API, so the dispatch succeeds unconditionally.
/// Acknowledgement happens when the recipient reads it.
#[derive(Debug, Clone, Default)]
pub struct InappAdapter;

impl InappAdapter {
    /// Build the adapter.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChannelAdapter for InappAdapter {
    fn channel(&self) -> Channel {
        Channel::Inapp
    }

    async fn dispatch(&self, _notification: &Notification) -> DeliveryOutcome {
        DeliveryOutcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inapp_always_accepts() {
        let adapter = InappAdapter::new();
        let notification = pulse_entity::test_support::notification();
        assert_eq!(
            adapter.dispatch(&notification).await,
            DeliveryOutcome::Accepted
        );
    }
}
