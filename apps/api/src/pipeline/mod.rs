//! The résumé parse pipeline.
//!
//! A parse job moves `pending → extracting → structuring → validating → persisting
//! → success`, or drops into `error` from any non-terminal stage. Each job runs as
//! one spawned task; its progress is published through the shared `ParseTracker`
//! so clients can poll it.

pub mod error;
pub mod handlers;
mod orchestrator;
mod retry;

use std::sync::Arc;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::extract::TextExtractor;
use crate::jobs::{ParseJob, ParseTracker, UploadTracker};
use crate::resume::store::ResumeStore;
use crate::storage::ArtifactStore;
use crate::structuring::ResumeStructurer;

pub use error::{FailureKind, PipelineError};
pub use orchestrator::AdmissionError;
pub use retry::RetryRejection;

/// Progress reported on entering each stage. `Error` always reports 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCheckpoints {
    pub extracting: u8,
    pub structuring: u8,
    pub validating: u8,
    pub persisting: u8,
    pub success: u8,
}

impl Default for ProgressCheckpoints {
    fn default() -> Self {
        Self {
            extracting: 20,
            structuring: 50,
            validating: 70,
            persisting: 90,
            success: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Extracted text shorter than this (after trimming) fails the extraction stage.
    pub min_text_chars: usize,
    pub checkpoints: ProgressCheckpoints,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_text_chars: 50,
            checkpoints: ProgressCheckpoints::default(),
        }
    }
}

pub struct ParsePipeline {
    jobs: Arc<ParseTracker>,
    uploads: Arc<UploadTracker>,
    artifacts: Arc<dyn ArtifactStore>,
    extractor: Arc<dyn TextExtractor>,
    structurer: Arc<dyn ResumeStructurer>,
    records: Arc<dyn ResumeStore>,
    settings: PipelineSettings,
}

impl ParsePipeline {
    pub fn new(
        jobs: Arc<ParseTracker>,
        uploads: Arc<UploadTracker>,
        artifacts: Arc<dyn ArtifactStore>,
        extractor: Arc<dyn TextExtractor>,
        structurer: Arc<dyn ResumeStructurer>,
        records: Arc<dyn ResumeStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            jobs,
            uploads,
            artifacts,
            extractor,
            structurer,
            records,
            settings,
        }
    }

    pub fn jobs(&self) -> &Arc<ParseTracker> {
        &self.jobs
    }
}

/// A running parse job. Dropping the handle detaches the task; it keeps running.
#[derive(Debug)]
pub struct ParseHandle {
    pub job_id: Uuid,
    task: JoinHandle<Option<ParseJob>>,
}

impl ParseHandle {
    /// Waits for the run to finish and returns the terminal record, or `None`
    /// if the job was deleted while it ran.
    pub async fn wait(self) -> Option<ParseJob> {
        self.task.await.ok().flatten()
    }
}
