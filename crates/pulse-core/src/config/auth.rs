//! Authentication configuration: JWT verification and system API keys.

use serde::{Deserialize, Serialize};

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to verify bearer JWTs.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (used by the test encoder).
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
    /// API keys accepted on `/api/system/*`, keyed by producer name.
    ///
    /// Example: `{ "matching-service" = "mk_live_..." }`.
    #[serde(default)]
    pub system_api_keys: std::collections::HashMap<String, String>,
}

fn default_token_ttl() -> u64 {
    3600
}
