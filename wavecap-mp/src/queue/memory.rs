//! In-memory event sink for tests

use async_trait::async_trait;
use tokio::sync::Mutex;
use wavecap_common::Result;

use super::EventSink;

/// Records every emitted event instead of producing it.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<EmittedEvent>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedEvent {
    pub topic: String,
    pub key: String,
    pub value: String,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<EmittedEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn emit(&self, topic: &str, key: &str, value: &str) -> Result<()> {
        self.events.lock().await.push(EmittedEvent {
            topic: topic.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}
