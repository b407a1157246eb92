mod log;
mod memory;
mod webhook;

pub use log::LogPublisher;
pub use memory::MemoryPublisher;
pub use webhook::WebhookPublisher;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::FileEvent;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Abstraction over pub/sub backends.
///
/// Publishing is at-most-once: callers treat failures as best-effort and
/// never fail the primary operation over them.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, event: &FileEvent) -> Result<(), PublishError>;
}
