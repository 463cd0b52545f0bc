//! Email vendor adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use pulse_core::config::channels::VendorConfig;
use pulse_entity::{Channel, DeliveryOutcome, Notification};

use crate::adapter::ChannelAdapter;
use crate::push::classify_status;

/// Dispatches notifications to an external email vendor over HTTP.
///
/// Recipient address resolution is the vendor's job; Pulse only knows
/// recipient IDs.
#[derive(Debug, Clone)]
pub struct EmailAdapter {
    client: reqwest::Client,
    config: VendorConfig,
}

impl EmailAdapter {
    /// Build the adapter from vendor configuration.
    pub fn new(config: VendorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.deadline_seconds))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

#[async_trait]
impl ChannelAdapter for EmailAdapter {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn dispatch(&self, notification: &Notification) -> DeliveryOutcome {
        if !self.config.enabled || self.config.endpoint.is_empty() {
            return DeliveryOutcome::Permanent("Email channel is disabled".to_string());
        }

        let body = json!({
            "notificationId": notification.id,
            "recipientId": notification.recipient_id,
            "subject": notification.title,
            "body": notification.body,
            "kind": notification.kind,
        });

        let result = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) => {
                debug!(id = %notification.id, status = %response.status(), "Email dispatch");
                classify_status(response.status())
            }
            Err(e) if e.is_timeout() => {
                DeliveryOutcome::Transient("Email vendor deadline exceeded".to_string())
            }
            Err(e) => DeliveryOutcome::Transient(format!("Email vendor unreachable: {e}")),
        }
    }
}
