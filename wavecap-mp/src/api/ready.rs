//! Artifact readiness endpoint
//!
//! Readiness is defined by artifact presence, not by pipeline state:
//! all three derived objects must exist before the media counts as
//! transcribed.

use axum::{
    extract::{Query, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use wavecap_common::ArtifactKind;

use crate::error::{ApiError, ApiResult};
use crate::sanitize::sanitize;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReadyQuery {
    pub filename: String,
}

/// GET /vtt-ready?filename=<name>
///
/// Checks artifacts in a fixed order (caption, waveform, duration)
/// and reports the first one actually missing, so a caller polling
/// this endpoint sees which stage output has not landed yet.
pub async fn vtt_ready(
    State(state): State<AppState>,
    Query(query): Query<ReadyQuery>,
) -> ApiResult<Json<Value>> {
    let filename = sanitize(&query.filename);
    if filename.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "filename '{}' has no usable characters",
            query.filename
        )));
    }

    let mut fetched: Vec<Vec<u8>> = Vec::with_capacity(ArtifactKind::ALL.len());
    for kind in ArtifactKind::ALL {
        let bucket = match kind {
            ArtifactKind::Caption => &state.storage.captions_bucket,
            ArtifactKind::Waveform => &state.storage.waveforms_bucket,
            ArtifactKind::Duration => &state.storage.durations_bucket,
        };
        let key = kind.artifact_key(&filename);
        match state.gateway.get(bucket, &key).await {
            Ok(bytes) => fetched.push(bytes),
            Err(e) if e.is_not_found() => {
                return Err(ApiError::NotFound(format!(
                    "{} artifact not ready for '{}'",
                    kind.label(),
                    filename
                )));
            }
            Err(e) => return Err(e.into()),
        }
    }

    let duration = fetched.pop().unwrap_or_default();
    let waveform = fetched.pop().unwrap_or_default();
    let caption = fetched.pop().unwrap_or_default();

    Ok(Json(json!({
        "filename": filename,
        "vtt_content": String::from_utf8_lossy(&caption),
        "waveform": BASE64.encode(&waveform),
        "duration": String::from_utf8_lossy(&duration),
    })))
}
