//! # pulse-entity
//!
//! Domain entity models for the Pulse notification service: the
//! notification record, its closed category/priority/state enums, and
//! the per-channel delivery bookkeeping the delivery engine mutates.

pub mod notification;
pub mod test_support;

pub use notification::channel::{Channel, ChannelDelivery, DeliveryOutcome};
pub use notification::kind::NotificationKind;
pub use notification::model::{
    KindSummary, NewNotification, Notification, NotificationFilter, NotificationSort,
};
pub use notification::priority::NotificationPriority;
pub use notification::state::NotificationState;
