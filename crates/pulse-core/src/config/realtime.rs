//! Real-time socket configuration.

use serde::{Deserialize, Serialize};

/// Real-time socket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound frame buffer size per session.
    #[serde(default = "default_buffer")]
    pub session_buffer_size: usize,
    /// Maximum concurrent sessions per recipient.
    #[serde(default = "default_max_sessions")]
    pub max_sessions_per_recipient: usize,
    /// Ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            session_buffer_size: default_buffer(),
            max_sessions_per_recipient: default_max_sessions(),
            ping_interval_seconds: default_ping_interval(),
        }
    }
}

fn default_buffer() -> usize {
    64
}

fn default_max_sessions() -> usize {
    8
}

fn default_ping_interval() -> u64 {
    30
}
