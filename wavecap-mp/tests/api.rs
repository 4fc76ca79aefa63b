//! HTTP surface tests against the in-memory gateway

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;
use wavecap_mp::storage::{MemoryGateway, ObjectGateway};
use wavecap_mp::{build_router, AppState};

fn test_app() -> (Arc<MemoryGateway>, axum::Router) {
    let gateway = Arc::new(MemoryGateway::new());
    let state = AppState::new(
        Arc::clone(&gateway) as Arc<dyn ObjectGateway>,
        wavecap_mp::config::StorageConfig::default(),
    );
    (gateway, build_router(state))
}

/// Gateway whose reads and writes always fail at the backend.
struct FailingGateway;

#[async_trait::async_trait]
impl ObjectGateway for FailingGateway {
    async fn get(&self, bucket: &str, key: &str) -> wavecap_common::Result<Vec<u8>> {
        Err(wavecap_common::Error::StorageUnavailable(format!(
            "{}/{} unreachable",
            bucket, key
        )))
    }

    async fn put(
        &self,
        _bucket: &str,
        _key: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> wavecap_common::Result<()> {
        Err(wavecap_common::Error::StorageUnavailable(
            "backend offline".into(),
        ))
    }

    async fn ensure_bucket(&self, _bucket: &str) -> wavecap_common::Result<()> {
        Ok(())
    }
}

fn failing_app() -> axum::Router {
    build_router(AppState::new(
        Arc::new(FailingGateway),
        wavecap_mp::config::StorageConfig::default(),
    ))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_body(boundary: &str, filename: &str, data: &[u8], name_field: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: audio/mpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    if let Some(name) = name_field {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"filename\"\r\n\r\n{name}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, boundary: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (_gateway, app) = test_app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "wavecap-mp");
}

#[tokio::test]
async fn upload_stores_media_under_sanitized_name() {
    let (gateway, app) = test_app();

    let body = multipart_body("XBOUND", "my clip (1).mp3", b"fake media bytes", None);
    let response = app
        .oneshot(multipart_request("/upload", "XBOUND", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filename"], "my_clip__1_.mp3");

    let stored = gateway.object("media", "my_clip__1_.mp3").await.unwrap();
    assert_eq!(stored.bytes, b"fake media bytes".to_vec());
    assert_eq!(stored.content_type, "audio/mpeg");
}

#[tokio::test]
async fn upload_filename_field_overrides_part_filename() {
    let (gateway, app) = test_app();

    let body = multipart_body(
        "XBOUND",
        "ignored.mp3",
        b"data",
        Some("../../etc/passwd"),
    );
    let response = app
        .oneshot(multipart_request("/upload", "XBOUND", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filename"], "passwd");
    assert!(gateway.object("media", "passwd").await.is_some());
    assert!(gateway.object("media", "ignored.mp3").await.is_none());
}

#[tokio::test]
async fn upload_rejects_unusable_filename() {
    let (gateway, app) = test_app();

    let body = multipart_body("XBOUND", "clip.mp3", b"data", Some("///"));
    let response = app
        .oneshot(multipart_request("/upload", "XBOUND", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(gateway.object_count().await, 0);
}

#[tokio::test]
async fn upload_rejects_missing_file_field() {
    let (_gateway, app) = test_app();

    let body = format!(
        "--XBOUND\r\nContent-Disposition: form-data; name=\"filename\"\r\n\r\nclip.mp3\r\n--XBOUND--\r\n"
    );
    let response = app
        .oneshot(multipart_request("/upload", "XBOUND", body.into_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vtt_ready_returns_all_artifacts_when_present() {
    let (gateway, app) = test_app();

    let waveform_bytes = vec![0x00u8, 0x00, 0x0c, 0x00];
    gateway
        .put("media-vtt", "clip1.mp3.vtt", b"0:00 -> 0:03\nhello\n".to_vec(), "text/vtt")
        .await
        .unwrap();
    gateway
        .put(
            "media-waveform",
            "clip1.mp3.waveform",
            waveform_bytes.clone(),
            "application/octet-stream",
        )
        .await
        .unwrap();
    gateway
        .put("media-duration", "clip1.mp3.duration", b"3.2".to_vec(), "text/plain")
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::get("/vtt-ready?filename=clip1.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["filename"], "clip1.mp3");
    assert_eq!(body["vtt_content"], "0:00 -> 0:03\nhello\n");
    assert_eq!(body["waveform"], BASE64.encode(&waveform_bytes));
    assert_eq!(body["duration"], "3.2");
}

#[tokio::test]
async fn vtt_ready_names_first_missing_artifact() {
    let (gateway, app) = test_app();

    // Caption present, waveform missing, duration present
    gateway
        .put("media-vtt", "clip1.mp3.vtt", b"text".to_vec(), "text/vtt")
        .await
        .unwrap();
    gateway
        .put("media-duration", "clip1.mp3.duration", b"3.2".to_vec(), "text/plain")
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::get("/vtt-ready?filename=clip1.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("waveform"));
}

#[tokio::test]
async fn vtt_ready_with_no_artifacts_names_caption() {
    let (_gateway, app) = test_app();

    let response = app
        .oneshot(
            Request::get("/vtt-ready?filename=never-uploaded.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("caption"));
}

#[tokio::test]
async fn upload_storage_failure_maps_to_storage_error() {
    let app = failing_app();

    let body = multipart_body("XBOUND", "clip.mp3", b"data", None);
    let response = app
        .oneshot(multipart_request("/upload", "XBOUND", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");
}

#[tokio::test]
async fn vtt_ready_storage_failure_maps_to_storage_error() {
    let app = failing_app();

    let response = app
        .oneshot(
            Request::get("/vtt-ready?filename=clip1.mp3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "STORAGE_ERROR");
}

#[tokio::test]
async fn vtt_ready_rejects_unusable_filename() {
    let (_gateway, app) = test_app();

    let response = app
        .oneshot(
            Request::get("/vtt-ready?filename=%2F%2F")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
