//! Queue event payload types
//!
//! Upload notifications arrive as S3-style bucket event envelopes
//! (JSON with a `Records` array). Completion events are produced per
//! artifact after a successful publish, carrying the artifact's
//! storage key as the message value.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// S3-style bucket notification envelope as delivered on the queue.
///
/// Only the fields the pipeline reads are modeled; everything else in
/// the envelope is ignored during deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

/// A single upload to process: the object's bucket and key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadNotification {
    pub bucket: String,
    pub key: String,
}

impl UploadNotification {
    /// Decode a raw queue message body into an upload notification.
    ///
    /// Returns `Error::MalformedNotification` when the body is not
    /// valid JSON or not an envelope. An envelope with an empty
    /// `Records` array returns `Ok(None)`; the consumer skips it
    /// with a warning rather than treating it as an error.
    pub fn parse(raw: &str) -> Result<Option<Self>> {
        let envelope: NotificationEnvelope = serde_json::from_str(raw)
            .map_err(|e| Error::MalformedNotification(e.to_string()))?;

        let Some(record) = envelope.records.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(UploadNotification {
            bucket: record.s3.bucket.name,
            key: record.s3.object.key,
        }))
    }
}

/// The three derived artifacts produced for every media key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Caption,
    Waveform,
    Duration,
}

impl ArtifactKind {
    /// All artifact kinds in publish (and readiness-check) order.
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Caption,
        ArtifactKind::Waveform,
        ArtifactKind::Duration,
    ];

    /// Suffix appended to the media key for this artifact's object.
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Caption => ".vtt",
            ArtifactKind::Waveform => ".waveform",
            ArtifactKind::Duration => ".duration",
        }
    }

    /// Content type used when storing this artifact.
    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Caption => "text/vtt",
            ArtifactKind::Waveform => "application/octet-stream",
            ArtifactKind::Duration => "text/plain",
        }
    }

    /// Label used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Caption => "caption",
            ArtifactKind::Waveform => "waveform",
            ArtifactKind::Duration => "duration",
        }
    }

    /// Storage key for this artifact derived from the media key.
    pub fn artifact_key(self, media_key: &str) -> String {
        format!("{}{}", media_key, self.suffix())
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
