//! Periodic eviction of stale terminal jobs.
//!
//! Jobs only live in memory, so without eviction the trackers grow for the life of
//! the process. Only terminal jobs whose last update is older than the TTL are
//! removed; an evicted upload takes its artifact with it unless a running parse
//! job still references it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::jobs::{ParseTracker, UploadTracker};
use crate::storage::{ArtifactStore, StorageError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub uploads_evicted: usize,
    pub parses_evicted: usize,
    pub artifacts_removed: usize,
}

pub struct JobSweeper {
    uploads: Arc<UploadTracker>,
    parses: Arc<ParseTracker>,
    artifacts: Arc<dyn ArtifactStore>,
    ttl: Duration,
}

impl JobSweeper {
    pub fn new(
        uploads: Arc<UploadTracker>,
        parses: Arc<ParseTracker>,
        artifacts: Arc<dyn ArtifactStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            uploads,
            parses,
            artifacts,
            ttl,
        }
    }

    pub async fn sweep_once(&self) -> SweepStats {
        let ttl = chrono::Duration::from_std(self.ttl)
            .unwrap_or_else(|_| chrono::Duration::days(365 * 100));
        let cutoff = Utc::now() - ttl;

        let parses_evicted = self
            .parses
            .evict_where(|job| job.is_terminal() && job.updated_at < cutoff)
            .len();

        // Uploads still feeding a live parse job stay put.
        let in_use: HashSet<Uuid> = self
            .parses
            .list()
            .into_iter()
            .filter(|job| !job.is_terminal())
            .map(|job| job.details.upload_ref)
            .collect();

        let evicted_uploads = self.uploads.evict_where(|job| {
            job.is_terminal() && job.updated_at < cutoff && !in_use.contains(&job.id)
        });

        let mut artifacts_removed = 0;
        for upload in &evicted_uploads {
            if upload.details.artifact.is_none() {
                continue;
            }
            match self.artifacts.remove(upload.id).await {
                Ok(()) => artifacts_removed += 1,
                Err(StorageError::NotFound(_)) => {}
                Err(e) => warn!(upload_id = %upload.id, "Failed to remove expired artifact: {e}"),
            }
        }

        let stats = SweepStats {
            uploads_evicted: evicted_uploads.len(),
            parses_evicted,
            artifacts_removed,
        };
        if stats != SweepStats::default() {
            info!(
                uploads = stats.uploads_evicted,
                parses = stats.parses_evicted,
                artifacts = stats.artifacts_removed,
                "Evicted expired jobs"
            );
        }
        stats
    }

    /// Runs `sweep_once` every `interval` until the returned handle is aborted.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                debug!("Running job sweep");
                self.sweep_once().await;
            }
        })
    }
}
