use async_trait::async_trait;

use super::{PublishError, Publisher};
use crate::events::FileEvent;

/// Publisher that emits events as structured log lines. The default backend
/// for deployments without a broker.
#[derive(Debug, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, topic: &str, event: &FileEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(topic, action = ?event.action, %payload, "published file event");
        Ok(())
    }
}
