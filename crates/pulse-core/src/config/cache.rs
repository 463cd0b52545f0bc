//! Cache provider configuration.

use serde::{Deserialize, Serialize};

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache provider: `"redis"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Default TTL for entries without an explicit TTL.
    #[serde(default = "default_ttl")]
    pub default_ttl_seconds: u64,
    /// TTL for cached list and grouped-summary queries.
    #[serde(default = "default_list_ttl")]
    pub list_ttl_seconds: u64,
    /// TTL for cached unread counts.
    #[serde(default = "default_count_ttl")]
    pub count_ttl_seconds: u64,
    /// Redis settings (when provider = "redis").
    #[serde(default)]
    pub redis: RedisCacheConfig,
    /// In-memory settings (when provider = "memory").
    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            default_ttl_seconds: default_ttl(),
            list_ttl_seconds: default_list_ttl(),
            count_ttl_seconds: default_count_ttl(),
            redis: RedisCacheConfig::default(),
            memory: MemoryCacheConfig::default(),
        }
    }
}

/// Redis cache backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_redis_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            connect_timeout_seconds: default_redis_timeout(),
        }
    }
}

/// In-memory cache backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Maximum number of entries.
    #[serde(default = "default_capacity")]
    pub max_capacity: u64,
    /// Cache-level time to live in seconds.
    #[serde(default = "default_memory_ttl")]
    pub time_to_live_seconds: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_capacity(),
            time_to_live_seconds: default_memory_ttl(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_ttl() -> u64 {
    300
}

fn default_list_ttl() -> u64 {
    300
}

fn default_count_ttl() -> u64 {
    60
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_redis_timeout() -> u64 {
    5
}

fn default_capacity() -> u64 {
    100_000
}

fn default_memory_ttl() -> u64 {
    300
}
