//! Per-channel vendor configuration.

use serde::{Deserialize, Serialize};

/// Settings for all delivery channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Push vendor settings.
    #[serde(default)]
    pub push: VendorConfig,
    /// Email vendor settings.
    #[serde(default)]
    pub email: VendorConfig,
    /// Socket dispatch deadline in milliseconds.
    #[serde(default = "default_socket_deadline_ms")]
    pub socket_deadline_ms: u64,
    /// Maximum concurrent outbound dispatches per adapter.
    #[serde(default = "default_dispatch_concurrency")]
    pub dispatch_concurrency: usize,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            push: VendorConfig::default(),
            email: VendorConfig::default(),
            socket_deadline_ms: default_socket_deadline_ms(),
            dispatch_concurrency: default_dispatch_concurrency(),
        }
    }
}

/// Configuration for an external HTTP delivery vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Whether the channel is available at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Vendor endpoint URL.
    #[serde(default)]
    pub endpoint: String,
    /// Vendor API key (sent as a bearer token).
    #[serde(default)]
    pub api_key: String,
    /// Per-call deadline in seconds.
    #[serde(default = "default_vendor_deadline")]
    pub deadline_seconds: u64,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: String::new(),
            api_key: String::new(),
            deadline_seconds: default_vendor_deadline(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_vendor_deadline() -> u64 {
    10
}

fn default_socket_deadline_ms() -> u64 {
    1000
}

fn default_dispatch_concurrency() -> usize {
    64
}
