//! Inference Client
//!
//! Sends normalized audio to the remote transcription service and
//! decodes the three named outputs. The remote service owns the
//! caption timestamp format and the waveform decimation stride; this
//! client treats both as opaque contract.

mod mock;
mod triton;
mod wire;

use async_trait::async_trait;
use wavecap_common::Result;

pub use mock::MockTranscriber;
pub use triton::TritonClient;
pub use wire::{decode_response, encode_request};

/// Everything one inference call produces. All-or-nothing: a failed
/// call yields no partial result.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionResult {
    /// Pre-joined caption block text ("<start> -> <end>\n<text>\n" blocks)
    pub caption: String,
    /// Decimated amplitude samples, signed 16-bit
    pub waveform: Vec<i16>,
    /// Media duration in seconds
    pub duration: f32,
}

impl TranscriptionResult {
    /// Waveform serialized as little-endian 16-bit samples, the
    /// on-storage format of the waveform artifact.
    pub fn waveform_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.waveform.len() * 2);
        for sample in &self.waveform {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Duration as the human-readable decimal string stored in the
    /// duration artifact (shortest round-trip form: `3.2`, not
    /// `3.2000000`).
    pub fn duration_string(&self) -> String {
        format!("{}", self.duration)
    }
}

/// Remote transcription service reached over request/response RPC.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe canonical PCM bytes.
    ///
    /// Errors: `Error::InferenceTimeout` on request timeout,
    /// `Error::InferenceService` on any other RPC-level failure or
    /// malformed output.
    async fn transcribe(&self, pcm: &[u8]) -> Result<TranscriptionResult>;
}
