//! Configuration for wavecap-mp
//!
//! Resolution order: built-in defaults, then the TOML config file
//! (if present), then `WAVECAP_*` environment variables for the
//! deployment-sensitive values (endpoints and credentials).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use wavecap_common::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub inference: InferenceConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Object storage endpoint and the four logical buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Bucket external producers (and POST /upload) write media into
    pub inbound_bucket: String,
    pub captions_bucket: String,
    pub waveforms_bucket: String,
    pub durations_bucket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub brokers: String,
    pub group_id: String,
    /// Topic carrying storage upload notifications
    pub notifications_topic: String,
    /// Completion event topics, one per artifact kind
    pub caption_topic: String,
    pub waveform_topic: String,
    pub duration_topic: String,
    /// Bounded wait per poll of the notification topic
    pub poll_interval_ms: u64,
    /// Pause after a queue-level receive error before polling again
    pub error_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL of the inference server (no trailing slash)
    pub url: String,
    /// Model name addressed in the infer request path
    pub model: String,
    /// Request timeout. Must stay below the queue redelivery window
    /// or a slow transcription gets reprocessed while still running.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Canonical PCM sample rate handed to the recognizer
    pub sample_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            queue: QueueConfig::default(),
            inference: InferenceConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio-server:9000".to_string(),
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            region: "us-east-1".to_string(),
            inbound_bucket: "media".to_string(),
            captions_bucket: "media-vtt".to_string(),
            waveforms_bucket: "media-waveform".to_string(),
            durations_bucket: "media-duration".to_string(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            brokers: "kafka:9092".to_string(),
            group_id: "wavecap-mp".to_string(),
            notifications_topic: "minio-events-v1".to_string(),
            caption_topic: "vtt-upload".to_string(),
            waveform_topic: "waveform-upload".to_string(),
            duration_topic: "duration-upload".to_string(),
            poll_interval_ms: 1000,
            error_backoff_ms: 5000,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            model: "faster-whisper-large-v3".to_string(),
            timeout_secs: 300,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: crate::audio::CANONICAL_SAMPLE_RATE,
        }
    }
}

impl Config {
    /// Load configuration: defaults, then TOML file, then env overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("parse {}: {}", path.display(), e)))?;
            info!(path = %path.display(), "Loaded configuration file");
            config
        } else {
            info!(path = %path.display(), "No configuration file, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment overrides for the values that differ per deployment.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("WAVECAP_STORAGE_ENDPOINT") {
            self.storage.endpoint = v;
        }
        if let Ok(v) = std::env::var("WAVECAP_STORAGE_ACCESS_KEY") {
            self.storage.access_key = v;
        }
        if let Ok(v) = std::env::var("WAVECAP_STORAGE_SECRET_KEY") {
            self.storage.secret_key = v;
        }
        if let Ok(v) = std::env::var("WAVECAP_QUEUE_BROKERS") {
            self.queue.brokers = v;
        }
        if let Ok(v) = std::env::var("WAVECAP_INFERENCE_URL") {
            self.inference.url = v;
        }
        if let Ok(v) = std::env::var("WAVECAP_PORT") {
            if let Ok(port) = v.parse() {
                self.server.port = port;
            }
        }
    }

    /// Reject configurations that cannot work at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port cannot be 0".into()));
        }
        for (name, value) in [
            ("storage.inbound_bucket", &self.storage.inbound_bucket),
            ("storage.captions_bucket", &self.storage.captions_bucket),
            ("storage.waveforms_bucket", &self.storage.waveforms_bucket),
            ("storage.durations_bucket", &self.storage.durations_bucket),
            ("queue.brokers", &self.queue.brokers),
            ("queue.notifications_topic", &self.queue.notifications_topic),
            ("queue.caption_topic", &self.queue.caption_topic),
            ("queue.waveform_topic", &self.queue.waveform_topic),
            ("queue.duration_topic", &self.queue.duration_topic),
            ("inference.url", &self.inference.url),
            ("inference.model", &self.inference.model),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", name)));
            }
        }
        if self.inference.timeout_secs == 0 {
            return Err(Error::Config("inference.timeout_secs cannot be 0".into()));
        }
        if self.audio.sample_rate == 0 {
            return Err(Error::Config("audio.sample_rate cannot be 0".into()));
        }
        Ok(())
    }
}
