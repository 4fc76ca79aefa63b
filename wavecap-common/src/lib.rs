//! # WaveCap Common Library
//!
//! Shared code for the WaveCap media processing pipeline:
//! - Error taxonomy (`Error` enum)
//! - Queue notification payload types
//! - Artifact kind definitions (caption / waveform / duration)

pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{ArtifactKind, UploadNotification};
