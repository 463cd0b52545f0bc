//! The channel adapter seam.

use async_trait::async_trait;

use pulse_entity::{Channel, DeliveryOutcome, Notification};

/// One delivery mechanism.
///
/// `dispatch` is infallible by design: every failure mode is folded
/// into the returned [`DeliveryOutcome`] so the engine can apply a
/// single retry policy. Adapters must respect their own deadline and
/// report an overrun as [`DeliveryOutcome::Transient`].
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// The channel this adapter serves.
    fn channel(&self) -> Channel;

    /// Attempt a single delivery of the notification.
    async fn dispatch(&self, notification: &Notification) -> DeliveryOutcome;
}
