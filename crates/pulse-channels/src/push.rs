//! Push notification vendor adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use tracing::debug;

use pulse_core::config::channels::VendorConfig;
use pulse_entity::{Channel, DeliveryOutcome, Notification};

use crate::adapter::ChannelAdapter;

/// Dispatches notifications to an external push vendor over HTTP.
#[derive(Debug, Clone)]
pub struct PushAdapter {
    client: reqwest::Client,
    config: VendorConfig,
}

impl PushAdapter {
    /// Build the adapter from vendor configuration.
    pub fn new(config: VendorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.deadline_seconds))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

/// Classify a vendor HTTP status into a delivery outcome.
///
/// 2xx means the vendor queued the push (delivery still unconfirmed),
/// 4xx is a rejection worth no retry, everything else is retryable.
pub(crate) fn classify_status(status: StatusCode) -> DeliveryOutcome {
    if status.is_success() {
        DeliveryOutcome::Accepted
    } else if status.is_client_error() {
        DeliveryOutcome::Permanent(format!("Vendor rejected dispatch: {status}"))
    } else {
        DeliveryOutcome::Transient(format!("Vendor error: {status}"))
    }
}

#[async_trait]
impl ChannelAdapter for PushAdapter {
    fn channel(&self) -> Channel {
        Channel::Push
    }

    async fn dispatch(&self, notification: &Notification) -> DeliveryOutcome {
        if !self.config.enabled || self.config.endpoint.is_empty() {
            return DeliveryOutcome::Permanent("Push channel is disabled".to_string());
        }

        let body = json!({
            "notificationId": notification.id,
            "recipientId": notification.recipient_id,
            "title": notification.title,
            "body": notification.body,
            "kind": notification.kind,
            "priority": notification.priority,
            "metadata": notification.metadata,
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
                debug!(id = %notification.id, status = %response.status(), "Push dispatch");
                classify_status(response.status())
            }
            Err(e) if e.is_timeout() => {
                DeliveryOutcome::Transient("Push vendor deadline exceeded".to_string())
            }
            Err(e) => DeliveryOutcome::Transient(format!("Push vendor unreachable: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(StatusCode::OK), DeliveryOutcome::Accepted);
        assert_eq!(
            classify_status(StatusCode::ACCEPTED),
            DeliveryOutcome::Accepted
        );
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST),
            DeliveryOutcome::Permanent(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            DeliveryOutcome::Permanent(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            DeliveryOutcome::Transient(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            DeliveryOutcome::Transient(_)
        ));
    }

    #[tokio::test]
    async fn disabled_vendor_is_permanent() {
        let adapter = PushAdapter::new(VendorConfig {
            enabled: false,
            ..Default::default()
        });
        let notification = pulse_entity::test_support::notification();
        assert!(matches!(
            adapter.dispatch(&notification).await,
            DeliveryOutcome::Permanent(_)
        ));
    }
}
