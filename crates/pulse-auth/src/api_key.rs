//! Static API key verification for system producers.

use std::collections::HashMap;

use pulse_core::config::auth::AuthConfig;
use pulse_core::error::AppError;
use pulse_core::result::AppResult;

/// Verifies `x-api-key` header values against the configured key set.
#[derive(Debug, Clone)]
pub struct ApiKeyVerifier {
    /// Key value → producer name.
    keys: HashMap<String, String>,
}

impl ApiKeyVerifier {
    /// Build a verifier from configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let keys = config
            .system_api_keys
            .iter()
            .map(|(producer, key)| (key.clone(), producer.clone()))
            .collect();
        Self { keys }
    }

    /// Resolve an API key to its producer name.
    pub fn verify(&self, presented: &str) -> AppResult<&str> {
        self.keys
            .get(presented)
            .map(String::as_str)
            .ok_or_else(|| AppError::authentication("Invalid API key"))
    }
}
