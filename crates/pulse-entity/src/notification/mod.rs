//! Notification entity: record model, category, priority, state, channels.

pub mod channel;
pub mod kind;
pub mod model;
pub mod priority;
pub mod state;
