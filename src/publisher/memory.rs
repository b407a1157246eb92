use std::sync::Mutex;

use async_trait::async_trait;

use super::{PublishError, Publisher};
use crate::events::FileEvent;

/// In-process publisher that records every event it receives. Useful for
/// tests and for embedding the registry without a broker.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    events: Mutex<Vec<(String, FileEvent)>>,
    fail: Mutex<bool>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far, as (topic, event) pairs.
    pub fn events(&self) -> Vec<(String, FileEvent)> {
        self.events.lock().expect("publisher lock poisoned").clone()
    }

    /// Make subsequent publishes fail, to exercise best-effort semantics.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().expect("publisher lock poisoned") = fail;
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, topic: &str, event: &FileEvent) -> Result<(), PublishError> {
        if *self.fail.lock().expect("publisher lock poisoned") {
            return Err(PublishError::Backend("publisher unavailable".to_string()));
        }
        self.events
            .lock()
            .expect("publisher lock poisoned")
            .push((topic.to_string(), event.clone()));
        Ok(())
    }
}
