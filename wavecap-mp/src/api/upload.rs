//! Media upload endpoint
//!
//! Accepts a multipart form and writes the media bytes into the
//! inbound bucket under the sanitized filename. Storage's own
//! upload notification then drives the pipeline; this handler does
//! no transcription work itself.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::sanitize::sanitize;
use crate::AppState;

/// POST /upload
///
/// Multipart fields:
/// - `file` (required): the media bytes; the part's filename names
///   the object unless a `filename` field overrides it
/// - `filename` (optional): explicit object name
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut explicit_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let part_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read file field: {}", e)))?;
                file = Some((part_name, content_type, bytes.to_vec()));
            }
            Some("filename") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read filename field: {}", e)))?;
                explicit_name = Some(value);
            }
            _ => {}
        }
    }

    let (part_name, content_type, bytes) = file
        .ok_or_else(|| ApiError::BadRequest("missing 'file' field".into()))?;

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("file field is empty".into()));
    }

    let requested = explicit_name.unwrap_or(part_name);
    let filename = sanitize(&requested);
    if filename.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "filename '{}' has no usable characters",
            requested
        )));
    }

    state
        .gateway
        .put(&state.storage.inbound_bucket, &filename, bytes, &content_type)
        .await?;

    info!(
        bucket = %state.storage.inbound_bucket,
        filename = %filename,
        "Media uploaded"
    );

    Ok(Json(json!({
        "message": "upload accepted",
        "filename": filename,
    })))
}
