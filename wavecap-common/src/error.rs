//! Common error types for WaveCap

use thiserror::Error;

/// Common result type for WaveCap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the WaveCap pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Requested storage object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend unreachable or rejected the operation
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Audio byte stream could not be decoded by any supported codec
    #[error("Unsupported media format: {0}")]
    UnsupportedFormat(String),

    /// Inference request exceeded the configured timeout
    #[error("Inference request timed out after {0} seconds")]
    InferenceTimeout(u64),

    /// Inference RPC failed or returned malformed output
    #[error("Inference service error: {0}")]
    InferenceService(String),

    /// One of the three artifact writes failed
    #[error("Failed to publish {artifact} artifact: {message}")]
    Publish { artifact: String, message: String },

    /// Queue message body could not be decoded
    #[error("Malformed notification: {0}")]
    MalformedNotification(String),

    /// Queue client error (wraps transport-level failures)
    #[error("Queue error: {0}")]
    Queue(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the error means a storage object is absent rather
    /// than the backend being unreachable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
