//! Artifact Publisher
//!
//! Writes the three derived artifacts for a media key and emits one
//! completion event per artifact. Writes happen in a fixed order
//! (caption, waveform, duration); a failure surfaces as
//! `Error::Publish` naming the artifact and leaves any earlier
//! writes in place (no rollback). Event emission failures are logged
//! and never retried; they do not undo the writes.

use std::sync::Arc;

use tracing::{info, warn};
use wavecap_common::{ArtifactKind, Error, Result};

use crate::config::{QueueConfig, StorageConfig};
use crate::inference::TranscriptionResult;
use crate::queue::EventSink;
use crate::storage::ObjectGateway;

pub struct Publisher {
    gateway: Arc<dyn ObjectGateway>,
    sink: Arc<dyn EventSink>,
    storage: StorageConfig,
    queue: QueueConfig,
}

impl Publisher {
    pub fn new(
        gateway: Arc<dyn ObjectGateway>,
        sink: Arc<dyn EventSink>,
        storage: StorageConfig,
        queue: QueueConfig,
    ) -> Self {
        Self {
            gateway,
            sink,
            storage,
            queue,
        }
    }

    /// Destination bucket for an artifact kind.
    pub fn bucket_for(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Caption => &self.storage.captions_bucket,
            ArtifactKind::Waveform => &self.storage.waveforms_bucket,
            ArtifactKind::Duration => &self.storage.durations_bucket,
        }
    }

    /// Completion event topic for an artifact kind.
    fn topic_for(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Caption => &self.queue.caption_topic,
            ArtifactKind::Waveform => &self.queue.waveform_topic,
            ArtifactKind::Duration => &self.queue.duration_topic,
        }
    }

    /// Publish all three artifacts for `key`, then emit completion
    /// events. Re-publishing the same result under the same key
    /// overwrites all three artifacts with identical content.
    pub async fn publish(&self, key: &str, result: &TranscriptionResult) -> Result<()> {
        for kind in ArtifactKind::ALL {
            let bytes = match kind {
                ArtifactKind::Caption => result.caption.as_bytes().to_vec(),
                ArtifactKind::Waveform => result.waveform_bytes(),
                ArtifactKind::Duration => result.duration_string().into_bytes(),
            };

            let artifact_key = kind.artifact_key(key);
            let bucket = self.bucket_for(kind);

            self.gateway
                .put(bucket, &artifact_key, bytes, kind.content_type())
                .await
                .map_err(|e| Error::Publish {
                    artifact: kind.label().to_string(),
                    message: e.to_string(),
                })?;

            info!(bucket, key = %artifact_key, artifact = %kind, "Artifact stored");
        }

        // All writes succeeded; completion events are fire-and-forget
        for kind in ArtifactKind::ALL {
            let artifact_key = kind.artifact_key(key);
            let topic = self.topic_for(kind);
            if let Err(e) = self.sink.emit(topic, key, &artifact_key).await {
                warn!(topic, key = %artifact_key, error = %e,
                    "Failed to emit completion event (not retried)");
            }
        }

        Ok(())
    }
}
