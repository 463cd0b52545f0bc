//! Socket wire frame definitions.

pub mod types;

pub use types::{InboundFrame, NotificationRecord, OutboundFrame};
