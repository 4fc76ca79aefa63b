//! Kafka implementations of the queue ports
//!
//! Offsets auto-commit: a notification may be committed before its
//! pipeline run finishes, so delivery is at-least-once with possible
//! duplicate completion events. Storage writes are overwrite-
//! idempotent, which makes redelivery safe.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::Message;
use tracing::{debug, info};
use wavecap_common::{Error, Result};

use super::{EventSink, NotificationSource};
use crate::config::QueueConfig;

const PRODUCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Consumer-group subscriber on the notifications topic.
pub struct KafkaSource {
    consumer: StreamConsumer,
}

impl KafkaSource {
    pub fn new(config: &QueueConfig) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .create()
            .map_err(|e| Error::Queue(e.to_string()))?;

        consumer
            .subscribe(&[&config.notifications_topic])
            .map_err(|e| Error::Queue(e.to_string()))?;

        info!(
            brokers = %config.brokers,
            topic = %config.notifications_topic,
            group = %config.group_id,
            "Kafka consumer initialized"
        );

        Ok(Self { consumer })
    }
}

#[async_trait]
impl NotificationSource for KafkaSource {
    async fn poll(&self, wait: Duration) -> Result<Option<String>> {
        match tokio::time::timeout(wait, self.consumer.recv()).await {
            // Bounded wait elapsed with nothing to read
            Err(_) => Ok(None),
            Ok(Err(e)) => Err(Error::Queue(e.to_string())),
            Ok(Ok(message)) => {
                let payload = message
                    .payload()
                    .map(|p| String::from_utf8_lossy(p).into_owned())
                    .unwrap_or_default();
                debug!(
                    topic = message.topic(),
                    partition = message.partition(),
                    offset = message.offset(),
                    len = payload.len(),
                    "Received queue message"
                );
                Ok(Some(payload))
            }
        }
    }
}

/// Producer for completion events.
pub struct KafkaSink {
    producer: FutureProducer,
}

impl KafkaSink {
    pub fn new(config: &QueueConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .create()
            .map_err(|e| Error::Queue(e.to_string()))?;

        info!(brokers = %config.brokers, "Kafka producer initialized");
        Ok(Self { producer })
    }
}

#[async_trait]
impl EventSink for KafkaSink {
    async fn emit(&self, topic: &str, key: &str, value: &str) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, PRODUCE_TIMEOUT)
            .await
            .map_err(|(e, _)| Error::Queue(e.to_string()))?;

        debug!(topic, key, "Emitted completion event");
        Ok(())
    }
}
