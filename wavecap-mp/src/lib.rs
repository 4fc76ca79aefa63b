//! wavecap-mp library - Media Processing service
//!
//! Event-driven transcription pipeline: storage upload notifications
//! are consumed from the queue, media is normalized to canonical PCM,
//! transcribed by a remote recognizer, and the derived artifacts
//! (caption, waveform, duration) are published back to object storage
//! with one completion event each. A small HTTP surface handles
//! direct uploads and artifact readiness checks.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod audio;
pub mod config;
pub mod consumer;
pub mod error;
pub mod inference;
pub mod publisher;
pub mod queue;
pub mod sanitize;
pub mod storage;

use config::StorageConfig;
use storage::ObjectGateway;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ObjectGateway>,
    pub storage: StorageConfig,
}

impl AppState {
    pub fn new(gateway: Arc<dyn ObjectGateway>, storage: StorageConfig) -> Self {
        Self { gateway, storage }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/upload", post(api::upload))
        .route("/vtt-ready", get(api::vtt_ready))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
