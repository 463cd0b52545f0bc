//! # pulse-channels
//!
//! Channel adapters: one implementation of [`adapter::ChannelAdapter`]
//! per delivery mechanism. Adapters classify every dispatch into a
//! [`pulse_entity::DeliveryOutcome`]; they never retry themselves, the
//! delivery engine owns retry policy.

pub mod adapter;
pub mod email;
pub mod inapp;
pub mod push;
pub mod socket;
pub mod testing;

pub use adapter::ChannelAdapter;
pub use email::EmailAdapter;
pub use inapp::InappAdapter;
pub use push::PushAdapter;
pub use socket::SocketAdapter;
