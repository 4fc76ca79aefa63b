//! wavecap-mp (Media Processing) - transcription pipeline service
//!
//! Runs two supervised tasks under one lifecycle: the HTTP server
//! (upload and readiness endpoints) and the upload notification
//! consumer. Either task finishing is fatal for the process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{error, info};

use wavecap_mp::config::Config;
use wavecap_mp::consumer::PipelineConsumer;
use wavecap_mp::inference::TritonClient;
use wavecap_mp::publisher::Publisher;
use wavecap_mp::queue::{EventSink, KafkaSink, KafkaSource};
use wavecap_mp::storage::{ObjectGateway, S3Gateway};
use wavecap_mp::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "wavecap-mp", about = "Media transcription pipeline service")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, env = "WAVECAP_CONFIG", default_value = "wavecap-mp.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting wavecap-mp v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    config.validate()?;

    // Storage gateway; all four buckets must exist before either task runs
    let gateway: Arc<dyn ObjectGateway> = Arc::new(S3Gateway::new(config.storage.clone())?);
    for bucket in [
        &config.storage.inbound_bucket,
        &config.storage.captions_bucket,
        &config.storage.waveforms_bucket,
        &config.storage.durations_bucket,
    ] {
        gateway.ensure_bucket(bucket).await?;
        info!(bucket, "Bucket ready");
    }

    let transcriber = Arc::new(TritonClient::new(&config.inference)?);
    let source = KafkaSource::new(&config.queue)?;
    let sink: Arc<dyn EventSink> = Arc::new(KafkaSink::new(&config.queue)?);

    let publisher = Publisher::new(
        Arc::clone(&gateway),
        sink,
        config.storage.clone(),
        config.queue.clone(),
    );

    let consumer = PipelineConsumer::new(
        Box::new(source),
        Arc::clone(&gateway),
        transcriber,
        publisher,
        config.audio.sample_rate,
        Duration::from_millis(config.queue.poll_interval_ms),
        Duration::from_millis(config.queue.error_backoff_ms),
    );
    let consumer_task = tokio::spawn(consumer.run());

    let state = AppState::new(gateway, config.storage.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("wavecap-mp listening on http://{}", addr);

    let server_task = tokio::spawn(async move {
        axum::serve(listener, app).await
    });

    // Neither task finishes in normal operation
    tokio::select! {
        result = consumer_task => {
            error!(?result, "Notification consumer exited");
            Err(anyhow!("notification consumer exited unexpectedly"))
        }
        result = server_task => {
            error!(?result, "HTTP server exited");
            Err(anyhow!("HTTP server exited unexpectedly"))
        }
    }
}
