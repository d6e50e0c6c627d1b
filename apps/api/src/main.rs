mod config;
mod errors;
mod extract;
mod jobs;
mod llm_client;
mod models;
mod pipeline;
mod render;
mod resume;
mod routes;
mod state;
mod storage;
mod structuring;
#[cfg(test)]
mod testing;
mod upload;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ArtifactBackend, Config};
use crate::extract::PdfTextExtractor;
use crate::jobs::sweeper::JobSweeper;
use crate::jobs::{ParseTracker, UploadTracker};
use crate::llm_client::LlmClient;
use crate::pipeline::{ParsePipeline, PipelineSettings};
use crate::render::HtmlSiteRenderer;
use crate::resume::store::RedisResumeStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{ArtifactStore, FsArtifactStore, MemoryArtifactStore, S3ArtifactStore};
use crate::structuring::LlmResumeStructurer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resumesite API v{}", env!("CARGO_PKG_VERSION"));

    let artifacts = build_artifact_store(&config).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let records = Arc::new(RedisResumeStore::new(redis));
    info!("Redis client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let uploads = Arc::new(UploadTracker::new());
    let parses = Arc::new(ParseTracker::new());
    let settings = PipelineSettings {
        min_text_chars: config.parse_min_text_chars,
        ..PipelineSettings::default()
    };
    let pipeline = Arc::new(ParsePipeline::new(
        parses.clone(),
        uploads.clone(),
        artifacts.clone(),
        Arc::new(PdfTextExtractor),
        Arc::new(LlmResumeStructurer::new(llm)),
        records.clone(),
        settings,
    ));

    let _sweeper = match config.job_ttl {
        Some(ttl) => {
            info!(
                "Job sweeper enabled (ttl: {}s, every {}s)",
                ttl.as_secs(),
                config.job_sweep_interval.as_secs()
            );
            Some(
                JobSweeper::new(uploads.clone(), parses, artifacts.clone(), ttl)
                    .spawn(config.job_sweep_interval),
            )
        }
        None => {
            info!("Job sweeper disabled");
            None
        }
    };

    // Build app state
    let state = AppState {
        config: config.clone(),
        uploads,
        pipeline,
        artifacts,
        records,
        renderer: Arc::new(HtmlSiteRenderer),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Picks the artifact backend named by `ARTIFACT_BACKEND`.
async fn build_artifact_store(config: &Config) -> Result<Arc<dyn ArtifactStore>> {
    let store: Arc<dyn ArtifactStore> = match &config.artifact_backend {
        ArtifactBackend::Filesystem => {
            tokio::fs::create_dir_all(&config.upload_dir).await?;
            info!("Artifact store: filesystem ({})", config.upload_dir.display());
            Arc::new(FsArtifactStore::new(config.upload_dir.clone()))
        }
        ArtifactBackend::S3 => {
            let settings = config
                .s3
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("S3 settings missing for ARTIFACT_BACKEND=s3"))?;
            info!("Artifact store: s3 (bucket: {})", settings.bucket);
            Arc::new(S3ArtifactStore::from_settings(settings).await)
        }
        ArtifactBackend::Memory => {
            info!("Artifact store: in-memory");
            Arc::new(MemoryArtifactStore::new())
        }
    };
    Ok(store)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
