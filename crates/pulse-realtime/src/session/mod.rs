//! Socket session tracking.

pub mod handle;
pub mod registry;

pub use handle::{SessionHandle, SessionId};
pub use registry::SessionRegistry;
