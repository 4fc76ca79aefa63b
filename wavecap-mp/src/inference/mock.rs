//! Mock transcriber for tests

use async_trait::async_trait;
use tokio::sync::Mutex;
use wavecap_common::{Error, Result};

use super::{Transcriber, TranscriptionResult};

/// Returns a canned result and records every PCM payload received.
pub struct MockTranscriber {
    result: TranscriptionResult,
    fail: bool,
    calls: Mutex<Vec<Vec<u8>>>,
}

impl MockTranscriber {
    pub fn returning(result: TranscriptionResult) -> Self {
        Self {
            result,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A transcriber whose every call fails with a service error.
    pub fn failing() -> Self {
        Self {
            result: TranscriptionResult {
                caption: String::new(),
                waveform: Vec::new(),
                duration: 0.0,
            },
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Byte lengths of the PCM payloads received so far.
    pub async fn call_sizes(&self) -> Vec<usize> {
        self.calls.lock().await.iter().map(Vec::len).collect()
    }

    /// The most recent PCM payload received, if any.
    pub async fn last_payload(&self) -> Option<Vec<u8>> {
        self.calls.lock().await.last().cloned()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, pcm: &[u8]) -> Result<TranscriptionResult> {
        self.calls.lock().await.push(pcm.to_vec());
        if self.fail {
            return Err(Error::InferenceService("mock failure".into()));
        }
        Ok(self.result.clone())
    }
}
