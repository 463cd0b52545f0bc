//! # pulse-realtime
//!
//! Live socket plumbing for Pulse: the per-connection session handle,
//! the recipient-indexed session registry, and the wire frame types
//! pushed to connected clients.
//!
//! The registry is in-process only; a recipient connected to another
//! node is invisible here and their socket deliveries fall back to the
//! retry path.

pub mod message;
pub mod session;

pub use message::{InboundFrame, NotificationRecord, OutboundFrame};
pub use session::handle::{SessionHandle, SessionId};
pub use session::registry::SessionRegistry;
