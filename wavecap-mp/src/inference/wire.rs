//! KServe v2 binary-tensor wire format
//!
//! Requests and responses are a JSON header followed by raw tensor
//! bytes; the `Inference-Header-Content-Length` HTTP header carries
//! the JSON length. Encode/decode are pure functions over byte
//! buffers so the protocol is testable without a live server.
//!
//! Tensor layout:
//! - `AUDIO` (request): UINT8, the normalized WAV bytes verbatim.
//! - `CAPTION` (response): BYTES, u32-LE length prefix + UTF-8.
//! - `WAVEFORM` (response): INT16, little-endian.
//! - `DURATION` (response): FP32, little-endian.

use serde::{Deserialize, Serialize};
use wavecap_common::{Error, Result};

use super::TranscriptionResult;

pub const INPUT_AUDIO: &str = "AUDIO";
pub const OUTPUT_CAPTION: &str = "CAPTION";
pub const OUTPUT_WAVEFORM: &str = "WAVEFORM";
pub const OUTPUT_DURATION: &str = "DURATION";

#[derive(Debug, Serialize)]
struct InferRequestHeader<'a> {
    inputs: Vec<RequestInput<'a>>,
    outputs: Vec<RequestOutput<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestInput<'a> {
    name: &'a str,
    shape: Vec<usize>,
    datatype: &'a str,
    parameters: BinarySizeParam,
}

#[derive(Debug, Serialize)]
struct BinarySizeParam {
    binary_data_size: usize,
}

#[derive(Debug, Serialize)]
struct RequestOutput<'a> {
    name: &'a str,
    parameters: BinaryFlagParam,
}

#[derive(Debug, Serialize)]
struct BinaryFlagParam {
    binary_data: bool,
}

#[derive(Debug, Deserialize)]
struct InferResponseHeader {
    #[serde(default)]
    outputs: Vec<ResponseOutput>,
}

#[derive(Debug, Deserialize)]
struct ResponseOutput {
    name: String,
    #[serde(default)]
    parameters: ResponseParams,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseParams {
    #[serde(default)]
    binary_data_size: usize,
}

/// Encode an infer request body. Returns the full body (JSON header
/// followed by the tensor bytes) and the JSON header length for the
/// `Inference-Header-Content-Length` HTTP header.
pub fn encode_request(pcm: &[u8]) -> Result<(Vec<u8>, usize)> {
    let header = InferRequestHeader {
        inputs: vec![RequestInput {
            name: INPUT_AUDIO,
            shape: vec![pcm.len()],
            datatype: "UINT8",
            parameters: BinarySizeParam {
                binary_data_size: pcm.len(),
            },
        }],
        outputs: vec![
            RequestOutput {
                name: OUTPUT_CAPTION,
                parameters: BinaryFlagParam { binary_data: true },
            },
            RequestOutput {
                name: OUTPUT_WAVEFORM,
                parameters: BinaryFlagParam { binary_data: true },
            },
            RequestOutput {
                name: OUTPUT_DURATION,
                parameters: BinaryFlagParam { binary_data: true },
            },
        ],
    };

    let header_json = serde_json::to_vec(&header)
        .map_err(|e| Error::InferenceService(format!("encode request header: {}", e)))?;
    let header_len = header_json.len();

    let mut body = header_json;
    body.extend_from_slice(pcm);
    Ok((body, header_len))
}

/// Decode an infer response: JSON header bytes plus the concatenated
/// binary tensor section (tensors appear in header order).
pub fn decode_response(header: &[u8], binary: &[u8]) -> Result<TranscriptionResult> {
    let header: InferResponseHeader = serde_json::from_slice(header)
        .map_err(|e| Error::InferenceService(format!("malformed response header: {}", e)))?;

    let mut caption: Option<String> = None;
    let mut waveform: Option<Vec<i16>> = None;
    let mut duration: Option<f32> = None;

    let mut offset = 0usize;
    for output in &header.outputs {
        let size = output.parameters.binary_data_size;
        let end = offset
            .checked_add(size)
            .filter(|end| *end <= binary.len())
            .ok_or_else(|| {
                Error::InferenceService(format!(
                    "output {} claims {} bytes past end of binary section",
                    output.name, size
                ))
            })?;
        let data = &binary[offset..end];
        offset = end;

        match output.name.as_str() {
            OUTPUT_CAPTION => caption = Some(decode_bytes_tensor(data)?),
            OUTPUT_WAVEFORM => waveform = Some(decode_i16_tensor(data)?),
            OUTPUT_DURATION => duration = Some(decode_f32_scalar(data)?),
            other => {
                // Unknown extra outputs are skipped, not fatal
                tracing::debug!(name = other, size, "Ignoring unexpected output tensor");
            }
        }
    }

    match (caption, waveform, duration) {
        (Some(caption), Some(waveform), Some(duration)) => Ok(TranscriptionResult {
            caption,
            waveform,
            duration,
        }),
        (caption, waveform, duration) => {
            let mut missing = Vec::new();
            if caption.is_none() {
                missing.push(OUTPUT_CAPTION);
            }
            if waveform.is_none() {
                missing.push(OUTPUT_WAVEFORM);
            }
            if duration.is_none() {
                missing.push(OUTPUT_DURATION);
            }
            Err(Error::InferenceService(format!(
                "response missing output tensors: {}",
                missing.join(", ")
            )))
        }
    }
}

/// BYTES tensor: u32-LE element length prefix, then UTF-8 content.
fn decode_bytes_tensor(data: &[u8]) -> Result<String> {
    if data.len() < 4 {
        return Err(Error::InferenceService(
            "caption tensor shorter than its length prefix".into(),
        ));
    }
    let len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let content = data
        .get(4..4 + len)
        .ok_or_else(|| Error::InferenceService("caption tensor truncated".into()))?;
    String::from_utf8(content.to_vec())
        .map_err(|e| Error::InferenceService(format!("caption is not UTF-8: {}", e)))
}

fn decode_i16_tensor(data: &[u8]) -> Result<Vec<i16>> {
    if data.len() % 2 != 0 {
        return Err(Error::InferenceService(
            "waveform tensor has odd byte length".into(),
        ));
    }
    Ok(data
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn decode_f32_scalar(data: &[u8]) -> Result<f32> {
    let bytes: [u8; 4] = data
        .get(..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::InferenceService("duration tensor truncated".into()))?;
    Ok(f32::from_le_bytes(bytes))
}
