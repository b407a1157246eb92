use async_trait::async_trait;
use reqwest::Client;

use super::{PublishError, Publisher};
use crate::events::FileEvent;

/// Publisher that delivers events to an HTTP endpoint as JSON, the way a
/// pub/sub sidecar pushes topic messages to subscribers.
pub struct WebhookPublisher {
    client: Client,
    endpoint: String,
}

impl WebhookPublisher {
    pub fn new(endpoint: &str) -> Result<Self, anyhow::Error> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    async fn publish(&self, topic: &str, event: &FileEvent) -> Result<(), PublishError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("X-Topic", topic)
            .json(event)
            .send()
            .await
            .map_err(|e| PublishError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Backend(format!(
                "Webhook delivery failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}
