//! Upload Notification Consumer
//!
//! The background loop that drives the pipeline: poll the queue with
//! a bounded wait, decode the notification, then fetch → normalize →
//! transcribe → publish, one notification at a time. Every failure
//! is terminal for that notification: logged, dropped, and the loop
//! continues. There is no retry beyond the queue's own redelivery.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use wavecap_common::{Result, UploadNotification};

use crate::audio::normalize;
use crate::inference::Transcriber;
use crate::publisher::Publisher;
use crate::queue::NotificationSource;
use crate::storage::ObjectGateway;

pub struct PipelineConsumer {
    source: Box<dyn NotificationSource>,
    gateway: Arc<dyn ObjectGateway>,
    transcriber: Arc<dyn Transcriber>,
    publisher: Publisher,
    sample_rate: u32,
    poll_interval: Duration,
    error_backoff: Duration,
}

impl PipelineConsumer {
    pub fn new(
        source: Box<dyn NotificationSource>,
        gateway: Arc<dyn ObjectGateway>,
        transcriber: Arc<dyn Transcriber>,
        publisher: Publisher,
        sample_rate: u32,
        poll_interval: Duration,
        error_backoff: Duration,
    ) -> Self {
        Self {
            source,
            gateway,
            transcriber,
            publisher,
            sample_rate,
            poll_interval,
            error_backoff,
        }
    }

    /// Run the consumer loop until the process shuts down.
    ///
    /// A source-level receive error pauses for the configured backoff
    /// before polling resumes; it never terminates the loop.
    pub async fn run(self) {
        info!("Upload notification consumer started");
        loop {
            match self.source.poll(self.poll_interval).await {
                Ok(None) => continue,
                Ok(Some(raw)) => self.process_raw(&raw).await,
                Err(e) => {
                    error!(error = %e, "Queue receive failed, backing off");
                    tokio::time::sleep(self.error_backoff).await;
                }
            }
        }
    }

    /// Handle one raw queue message body. Never propagates an error:
    /// malformed payloads and pipeline failures are logged and the
    /// notification is discarded.
    pub async fn process_raw(&self, raw: &str) {
        let notification = match UploadNotification::parse(raw) {
            Err(e) => {
                warn!(error = %e, "Skipping malformed notification");
                return;
            }
            Ok(None) => {
                warn!("Notification contains no records, skipping");
                return;
            }
            Ok(Some(notification)) => notification,
        };

        if let Err(e) = self.process(&notification).await {
            error!(
                bucket = %notification.bucket,
                key = %notification.key,
                error = %e,
                "Pipeline run failed, notification dropped"
            );
        }
    }

    /// Drive one notification through the pipeline stages.
    async fn process(&self, notification: &UploadNotification) -> Result<()> {
        info!(
            bucket = %notification.bucket,
            key = %notification.key,
            "Processing upload"
        );

        let raw = self
            .gateway
            .get(&notification.bucket, &notification.key)
            .await?;

        let pcm = normalize(&raw, self.sample_rate)?;

        let result = self.transcriber.transcribe(&pcm).await?;

        self.publisher.publish(&notification.key, &result).await?;

        info!(
            key = %notification.key,
            duration_seconds = result.duration,
            "Upload processed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::config::{QueueConfig, StorageConfig};
    use crate::inference::{MockTranscriber, TranscriptionResult};
    use crate::queue::{EventSink, MemorySink};
    use crate::storage::MemoryGateway;

    /// Minimal valid WAV so the normalizer succeeds.
    fn tiny_wav() -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..1600i32 {
                writer.write_sample((i % 100) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn build_consumer(
        transcriber: MockTranscriber,
    ) -> (Arc<MemoryGateway>, Arc<MemorySink>, Arc<MockTranscriber>, PipelineConsumer) {
        build_consumer_at(crate::audio::CANONICAL_SAMPLE_RATE, transcriber)
    }

    fn build_consumer_at(
        sample_rate: u32,
        transcriber: MockTranscriber,
    ) -> (Arc<MemoryGateway>, Arc<MemorySink>, Arc<MockTranscriber>, PipelineConsumer) {
        struct NeverSource;
        #[async_trait::async_trait]
        impl NotificationSource for NeverSource {
            async fn poll(&self, _wait: Duration) -> Result<Option<String>> {
                Ok(None)
            }
        }

        let gateway = Arc::new(MemoryGateway::new());
        let sink = Arc::new(MemorySink::new());
        let transcriber = Arc::new(transcriber);
        let publisher = Publisher::new(
            Arc::clone(&gateway) as Arc<dyn ObjectGateway>,
            Arc::clone(&sink) as Arc<dyn EventSink>,
            StorageConfig::default(),
            QueueConfig::default(),
        );
        let consumer = PipelineConsumer::new(
            Box::new(NeverSource),
            Arc::clone(&gateway) as Arc<dyn ObjectGateway>,
            Arc::clone(&transcriber) as Arc<dyn Transcriber>,
            publisher,
            sample_rate,
            Duration::from_millis(10),
            Duration::from_millis(10),
        );
        (gateway, sink, transcriber, consumer)
    }

    fn notification_json(bucket: &str, key: &str) -> String {
        format!(
            r#"{{"Records":[{{"s3":{{"bucket":{{"name":"{}"}},"object":{{"key":"{}"}}}}}}]}}"#,
            bucket, key
        )
    }

    #[tokio::test]
    async fn end_to_end_notification_produces_artifacts_and_events() {
        let result = TranscriptionResult {
            caption: "0:00 -> 0:03\nhello world\n".to_string(),
            waveform: vec![0, 12, -5],
            duration: 3.2,
        };
        let (gateway, sink, transcriber, consumer) =
            build_consumer(MockTranscriber::returning(result));

        gateway
            .put("media", "clip1.mp3", tiny_wav(), "audio/mpeg")
            .await
            .unwrap();

        consumer
            .process_raw(&notification_json("media", "clip1.mp3"))
            .await;

        // The transcriber saw normalized PCM, not the original bytes
        assert_eq!(transcriber.call_sizes().await.len(), 1);

        let caption = gateway.object("media-vtt", "clip1.mp3.vtt").await.unwrap();
        assert!(String::from_utf8(caption.bytes).unwrap().contains("hello world"));
        assert!(gateway
            .object("media-waveform", "clip1.mp3.waveform")
            .await
            .is_some());
        assert_eq!(
            gateway
                .object("media-duration", "clip1.mp3.duration")
                .await
                .unwrap()
                .bytes,
            b"3.2".to_vec()
        );

        assert_eq!(sink.events().await.len(), 3);
    }

    #[tokio::test]
    async fn configured_sample_rate_reaches_the_normalizer() {
        let result = TranscriptionResult {
            caption: String::new(),
            waveform: Vec::new(),
            duration: 0.1,
        };
        let (gateway, _sink, transcriber, consumer) =
            build_consumer_at(8_000, MockTranscriber::returning(result));

        gateway
            .put("media", "clip1.mp3", tiny_wav(), "audio/mpeg")
            .await
            .unwrap();

        consumer
            .process_raw(&notification_json("media", "clip1.mp3"))
            .await;

        let pcm = transcriber.last_payload().await.unwrap();
        let reader = hound::WavReader::new(Cursor::new(pcm)).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
    }

    #[tokio::test]
    async fn missing_object_drops_notification_without_side_effects() {
        let (gateway, sink, transcriber, consumer) =
            build_consumer(MockTranscriber::failing());

        consumer
            .process_raw(&notification_json("media", "ghost.mp3"))
            .await;

        // Nothing downstream ran
        assert!(transcriber.call_sizes().await.is_empty());
        assert_eq!(gateway.object_count().await, 0);
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn undecodable_media_is_dropped_before_inference() {
        let (gateway, sink, transcriber, consumer) =
            build_consumer(MockTranscriber::failing());

        gateway
            .put("media", "junk.bin", b"not audio".to_vec(), "application/octet-stream")
            .await
            .unwrap();

        consumer
            .process_raw(&notification_json("media", "junk.bin"))
            .await;

        assert!(transcriber.call_sizes().await.is_empty());
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn inference_failure_publishes_nothing() {
        let (gateway, sink, _transcriber, consumer) =
            build_consumer(MockTranscriber::failing());

        gateway
            .put("media", "clip1.mp3", tiny_wav(), "audio/mpeg")
            .await
            .unwrap();

        consumer
            .process_raw(&notification_json("media", "clip1.mp3"))
            .await;

        // Only the inbound object exists; no artifacts, no events
        assert_eq!(gateway.object_count().await, 1);
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_and_empty_notifications_are_skipped() {
        let (gateway, sink, _transcriber, consumer) =
            build_consumer(MockTranscriber::failing());

        consumer.process_raw("not json at all").await;
        consumer.process_raw(r#"{"Records":[]}"#).await;

        assert_eq!(gateway.object_count().await, 0);
        assert!(sink.events().await.is_empty());
    }
}
