//! Message queue ports
//!
//! Upload notifications are consumed from one topic; completion
//! events are produced to one topic per artifact kind. Both sides
//! are ports so the consumer loop and publisher can be exercised
//! against in-memory fakes.

mod kafka;
mod memory;

use std::time::Duration;

use async_trait::async_trait;
use wavecap_common::Result;

pub use kafka::{KafkaSink, KafkaSource};
pub use memory::MemorySink;

/// Source of raw upload-notification message bodies.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Poll with a bounded wait. `Ok(None)` means the wait elapsed
    /// with no message (not an error); `Err` is a transport-level
    /// receive failure.
    async fn poll(&self, wait: Duration) -> Result<Option<String>>;
}

/// Sink for completion events (fire-and-forget per artifact).
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emit one event: `value` is the artifact's storage key.
    async fn emit(&self, topic: &str, key: &str, value: &str) -> Result<()>;
}
