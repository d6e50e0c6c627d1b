use std::sync::Arc;

use crate::config::Config;
use crate::jobs::UploadTracker;
use crate::pipeline::ParsePipeline;
use crate::render::SiteRenderer;
use crate::resume::store::ResumeStore;
use crate::storage::ArtifactStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub uploads: Arc<UploadTracker>,
    /// Owns the parse job tracker; reach it through `pipeline.jobs()`.
    pub pipeline: Arc<ParsePipeline>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub records: Arc<dyn ResumeStore>,
    pub renderer: Arc<dyn SiteRenderer>,
}
