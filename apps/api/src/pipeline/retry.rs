use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::jobs::{JobStatus, ParseStatus, TrackerError};
use crate::pipeline::{ParseHandle, ParsePipeline};
use crate::storage::StorageError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryRejection {
    #[error("Parse job {0} not found")]
    NotFound(Uuid),

    #[error("Parse job {id} is {status}; only failed jobs can be retried")]
    NotRetryable { id: Uuid, status: &'static str },

    #[error("Uploaded file {upload_id} for parse job {parse_id} is no longer available")]
    ArtifactMissing { parse_id: Uuid, upload_id: Uuid },

    #[error("Could not check uploaded file {upload_id}: {reason}")]
    Storage { upload_id: Uuid, reason: String },
}

impl From<TrackerError> for RetryRejection {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::NotFound(id) => RetryRejection::NotFound(id),
            TrackerError::PreconditionFailed { id, status } => {
                RetryRejection::NotRetryable { id, status }
            }
        }
    }
}

impl ParsePipeline {
    /// Re-runs a failed parse job under the same id against the same upload.
    ///
    /// Rejected jobs are left exactly as they were. The reset to `pending` only
    /// happens if the job is still `error` at that moment, so two concurrent
    /// retries start at most one run.
    pub async fn retry(self: &Arc<Self>, parse_id: Uuid) -> Result<ParseHandle, RetryRejection> {
        let job = self
            .jobs
            .get(parse_id)
            .ok_or(RetryRejection::NotFound(parse_id))?;
        if job.status != ParseStatus::Error {
            return Err(RetryRejection::NotRetryable {
                id: parse_id,
                status: job.status.as_str(),
            });
        }

        let upload_id = job.details.upload_ref;
        match self.artifacts.resolve(upload_id).await {
            Ok(_) => {}
            Err(StorageError::NotFound(_)) => {
                return Err(RetryRejection::ArtifactMissing {
                    parse_id,
                    upload_id,
                })
            }
            Err(e) => {
                return Err(RetryRejection::Storage {
                    upload_id,
                    reason: e.to_string(),
                })
            }
        }

        self.jobs.modify_if(
            parse_id,
            |job| job.status == ParseStatus::Error,
            |job| {
                job.status = ParseStatus::Pending;
                job.progress = 0;
                job.message = "Retry queued".to_string();
                job.details.result = None;
                job.details.failure = None;
            },
        )?;
        info!(%parse_id, %upload_id, attempts = job.details.attempts, "Parse job retry queued");

        Ok(self.spawn_run(parse_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{ParseDetails, ParseTracker, UploadTracker};
    use crate::pipeline::PipelineSettings;
    use crate::storage::{ArtifactRef, ArtifactStore, MemoryArtifactStore};
    use crate::testing::{
        full_payload, FakeExtractor, FakeStructurer, Harness, MemoryResumeStore, RESUME_TEXT,
    };
    use async_trait::async_trait;
    use bytes::Bytes;

    /// Every lookup fails with an I/O style error, as an unreachable backend would.
    struct UnreachableStore(MemoryArtifactStore);

    #[async_trait]
    impl ArtifactStore for UnreachableStore {
        async fn store(&self, id: Uuid, bytes: Bytes) -> Result<ArtifactRef, StorageError> {
            self.0.store(id, bytes).await
        }

        async fn resolve(&self, id: Uuid) -> Result<ArtifactRef, StorageError> {
            Err(StorageError::Read {
                id,
                reason: "connection reset".to_string(),
            })
        }

        async fn load(&self, id: Uuid) -> Result<Bytes, StorageError> {
            self.0.load(id).await
        }

        async fn remove(&self, id: Uuid) -> Result<(), StorageError> {
            self.0.remove(id).await
        }
    }

    fn failing_once() -> Harness {
        Harness::new(
            FakeExtractor::returning(RESUME_TEXT),
            FakeStructurer::returning(full_payload()),
            MemoryResumeStore::failing_saves(1),
        )
    }

    #[tokio::test]
    async fn test_retry_unknown_job() {
        let h = failing_once();
        let id = Uuid::new_v4();
        assert_eq!(
            h.pipeline.retry(id).await.unwrap_err(),
            RetryRejection::NotFound(id)
        );
    }

    #[tokio::test]
    async fn test_retry_on_success_is_rejected_and_state_unchanged() {
        let h = Harness::new(
            FakeExtractor::returning(RESUME_TEXT),
            FakeStructurer::returning(full_payload()),
            MemoryResumeStore::new(),
        );
        let upload_id = h.stored_upload().await;
        let handle = h.pipeline.submit(upload_id).await.unwrap();
        let parse_id = handle.job_id;
        let before = handle.wait().await.unwrap();

        assert_eq!(
            h.pipeline.retry(parse_id).await.unwrap_err(),
            RetryRejection::NotRetryable {
                id: parse_id,
                status: "success"
            }
        );
        assert_eq!(h.parses.get(parse_id), Some(before));
    }

    #[tokio::test]
    async fn test_retry_on_running_job_is_rejected() {
        let h = failing_once();
        let upload_id = h.stored_upload().await;
        // Not yet polled, so still pending.
        let handle = h.pipeline.submit(upload_id).await.unwrap();
        let parse_id = handle.job_id;

        assert!(matches!(
            h.pipeline.retry(parse_id).await,
            Err(RetryRejection::NotRetryable { status: "pending", .. })
        ));
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_retry_without_artifact_is_rejected_and_state_unchanged() {
        let h = failing_once();
        let upload_id = h.stored_upload().await;
        let handle = h.pipeline.submit(upload_id).await.unwrap();
        let parse_id = handle.job_id;
        let failed = handle.wait().await.unwrap();
        assert_eq!(failed.status, ParseStatus::Error);

        h.artifacts.remove(upload_id).await.unwrap();
        assert_eq!(
            h.pipeline.retry(parse_id).await.unwrap_err(),
            RetryRejection::ArtifactMissing {
                parse_id,
                upload_id
            }
        );
        assert_eq!(h.parses.get(parse_id), Some(failed));
    }

    #[tokio::test]
    async fn test_retry_resets_to_pending_before_running() {
        let h = failing_once();
        let upload_id = h.stored_upload().await;
        let handle = h.pipeline.submit(upload_id).await.unwrap();
        let parse_id = handle.job_id;
        handle.wait().await.unwrap();

        let retried = h.pipeline.retry(parse_id).await.unwrap();
        let pending = h.parses.get(parse_id).unwrap();
        assert_eq!(pending.status, ParseStatus::Pending);
        assert_eq!(pending.progress, 0);
        assert!(pending.details.failure.is_none());
        assert_eq!(pending.details.upload_ref, upload_id);

        // A second retry while the first is queued is rejected.
        assert!(matches!(
            h.pipeline.retry(parse_id).await,
            Err(RetryRejection::NotRetryable { .. })
        ));

        let done = retried.wait().await.unwrap();
        assert_eq!(done.status, ParseStatus::Success);
    }

    #[tokio::test]
    async fn test_retry_with_unreachable_storage_is_not_reported_missing() {
        let parses = Arc::new(ParseTracker::new());
        let pipeline = Arc::new(ParsePipeline::new(
            parses.clone(),
            Arc::new(UploadTracker::new()),
            Arc::new(UnreachableStore(MemoryArtifactStore::new())),
            Arc::new(FakeExtractor::returning(RESUME_TEXT)),
            Arc::new(FakeStructurer::returning(full_payload())),
            Arc::new(MemoryResumeStore::new()),
            PipelineSettings::default(),
        ));

        let parse_id = Uuid::new_v4();
        let upload_id = Uuid::new_v4();
        parses.create(parse_id, ParseDetails::new(upload_id));
        parses
            .modify(parse_id, |job| job.status = ParseStatus::Error)
            .unwrap();
        let failed = parses.get(parse_id);

        let err = pipeline.retry(parse_id).await.unwrap_err();
        assert!(matches!(err, RetryRejection::Storage { upload_id: u, .. } if u == upload_id));
        assert_eq!(parses.get(parse_id), failed);
    }
}
