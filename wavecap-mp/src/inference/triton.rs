//! HTTP client for the remote inference server

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use wavecap_common::{Error, Result};

use super::wire::{decode_response, encode_request};
use super::{Transcriber, TranscriptionResult};
use crate::config::InferenceConfig;

const HEADER_CONTENT_LENGTH: &str = "Inference-Header-Content-Length";

/// Client for a KServe v2 inference endpoint
/// (`POST {base}/v2/models/{model}/infer`).
pub struct TritonClient {
    http: reqwest::Client,
    infer_url: String,
    timeout_secs: u64,
}

impl TritonClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::InferenceService(e.to_string()))?;

        let infer_url = format!(
            "{}/v2/models/{}/infer",
            config.url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            http,
            infer_url,
            timeout_secs: config.timeout_secs,
        })
    }

    /// The request timeout can fire while sending or while reading
    /// the response body; both surface as `InferenceTimeout`.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::InferenceTimeout(self.timeout_secs)
        } else {
            Error::InferenceService(e.to_string())
        }
    }
}

#[async_trait]
impl Transcriber for TritonClient {
    async fn transcribe(&self, pcm: &[u8]) -> Result<TranscriptionResult> {
        let (body, header_len) = encode_request(pcm)?;

        debug!(
            url = %self.infer_url,
            pcm_bytes = pcm.len(),
            "Sending inference request"
        );

        let response = self
            .http
            .post(&self.infer_url)
            .header("Content-Type", "application/octet-stream")
            .header(HEADER_CONTENT_LENGTH, header_len.to_string())
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::InferenceService(format!(
                "inference returned {}: {}",
                status, text
            )));
        }

        let response_header_len: usize = response
            .headers()
            .get(HEADER_CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                Error::InferenceService(format!(
                    "response missing {} header",
                    HEADER_CONTENT_LENGTH
                ))
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if bytes.len() < response_header_len {
            return Err(Error::InferenceService(
                "response shorter than declared header length".into(),
            ));
        }

        let (header, binary) = bytes.split_at(response_header_len);
        let result = decode_response(header, binary)?;

        debug!(
            caption_bytes = result.caption.len(),
            waveform_samples = result.waveform.len(),
            duration_seconds = result.duration,
            "Inference complete"
        );

        Ok(result)
    }
}
