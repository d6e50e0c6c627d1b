//! In-memory job state tracker.
//!
//! One tracker instance per job family lives in `AppState`. Every mutation replaces
//! the whole record under the write lock, so pollers only ever see a complete
//! snapshot. The lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::jobs::models::{JobRecord, JobStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("job {id} is {status}, which does not allow this transition")]
    PreconditionFailed { id: Uuid, status: &'static str },
}

struct Entry<S, D> {
    seq: u64,
    record: JobRecord<S, D>,
}

struct Inner<S, D> {
    jobs: HashMap<Uuid, Entry<S, D>>,
    next_seq: u64,
}

pub struct JobTracker<S, D> {
    inner: RwLock<Inner<S, D>>,
}

impl<S, D> Default for JobTracker<S, D> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner {
                jobs: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl<S, D> JobTracker<S, D>
where
    S: JobStatus,
    D: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    // A writer that panicked cannot have left a half-written record behind,
    // so a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Inner<S, D>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<S, D>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new job in the initial status with progress 0.
    pub fn create(&self, id: Uuid, details: D) -> JobRecord<S, D> {
        let now = Utc::now();
        let record = JobRecord {
            id,
            status: S::INITIAL,
            progress: 0,
            message: S::INITIAL.default_message().to_string(),
            created_at: now,
            updated_at: now,
            details,
        };

        let mut inner = self.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(
            id,
            Entry {
                seq,
                record: record.clone(),
            },
        );
        record
    }

    /// Overwrites status, progress and message.
    pub fn update(
        &self,
        id: Uuid,
        status: S,
        progress: u8,
        message: impl Into<String>,
    ) -> Result<JobRecord<S, D>, TrackerError> {
        let message = message.into();
        self.modify(id, |job| {
            job.status = status;
            job.progress = progress.min(100);
            job.message = message;
        })
    }

    /// Applies `f` to a copy of the record and swaps the copy in.
    pub fn modify(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut JobRecord<S, D>),
    ) -> Result<JobRecord<S, D>, TrackerError> {
        self.modify_if(id, |_| true, f)
    }

    /// Like `modify`, but only if `precondition` holds for the current record.
    /// The check and the write happen under the same lock.
    pub fn modify_if(
        &self,
        id: Uuid,
        precondition: impl FnOnce(&JobRecord<S, D>) -> bool,
        f: impl FnOnce(&mut JobRecord<S, D>),
    ) -> Result<JobRecord<S, D>, TrackerError> {
        let mut inner = self.write();
        let entry = inner.jobs.get_mut(&id).ok_or(TrackerError::NotFound(id))?;

        if !precondition(&entry.record) {
            return Err(TrackerError::PreconditionFailed {
                id,
                status: entry.record.status.as_str(),
            });
        }

        let mut next = entry.record.clone();
        f(&mut next);
        next.updated_at = Utc::now();
        entry.record = next;
        Ok(entry.record.clone())
    }

    pub fn get(&self, id: Uuid) -> Option<JobRecord<S, D>> {
        self.read().jobs.get(&id).map(|e| e.record.clone())
    }

    pub fn delete(&self, id: Uuid) -> Option<JobRecord<S, D>> {
        self.write().jobs.remove(&id).map(|e| e.record)
    }

    /// All jobs in insertion order.
    pub fn list(&self) -> Vec<JobRecord<S, D>> {
        let inner = self.read();
        let mut entries: Vec<&Entry<S, D>> = inner.jobs.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.record.clone()).collect()
    }

    /// Removes every job matching `predicate` and returns the removed records.
    pub fn evict_where(&self, predicate: impl Fn(&JobRecord<S, D>) -> bool) -> Vec<JobRecord<S, D>> {
        let mut inner = self.write();
        let doomed: Vec<Uuid> = inner
            .jobs
            .values()
            .filter(|e| predicate(&e.record))
            .map(|e| e.record.id)
            .collect();

        doomed
            .into_iter()
            .filter_map(|id| inner.jobs.remove(&id).map(|e| e.record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::models::{ParseDetails, ParseStatus};

    type Tracker = JobTracker<ParseStatus, ParseDetails>;

    fn details() -> ParseDetails {
        ParseDetails::new(Uuid::new_v4())
    }

    #[test]
    fn test_create_sets_initial_state() {
        let tracker = Tracker::new();
        let id = Uuid::new_v4();
        let job = tracker.create(id, details());

        assert_eq!(job.id, id);
        assert_eq!(job.status, ParseStatus::Pending);
        assert_eq!(job.progress, 0);
        assert!(!job.message.is_empty());
        assert_eq!(job.created_at, job.updated_at);
        assert_eq!(tracker.get(id), Some(job));
    }

    #[test]
    fn test_update_overwrites_and_bumps_timestamp() {
        let tracker = Tracker::new();
        let id = Uuid::new_v4();
        let created = tracker.create(id, details());

        let updated = tracker
            .update(id, ParseStatus::Extracting, 20, "extracting")
            .unwrap();
        assert_eq!(updated.status, ParseStatus::Extracting);
        assert_eq!(updated.progress, 20);
        assert_eq!(updated.message, "extracting");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[test]
    fn test_update_clamps_progress() {
        let tracker = Tracker::new();
        let id = Uuid::new_v4();
        tracker.create(id, details());
        let job = tracker.update(id, ParseStatus::Success, 250, "done").unwrap();
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let tracker = Tracker::new();
        let id = Uuid::new_v4();
        assert_eq!(
            tracker.update(id, ParseStatus::Extracting, 20, "x"),
            Err(TrackerError::NotFound(id))
        );
    }

    #[test]
    fn test_modify_if_rejects_and_leaves_record_untouched() {
        let tracker = Tracker::new();
        let id = Uuid::new_v4();
        let before = tracker.create(id, details());

        let r = tracker.modify_if(
            id,
            |job| job.status == ParseStatus::Error,
            |job| job.progress = 99,
        );
        assert_eq!(
            r,
            Err(TrackerError::PreconditionFailed {
                id,
                status: "pending"
            })
        );
        assert_eq!(tracker.get(id), Some(before));
    }

    #[test]
    fn test_delete_removes_from_get_and_list() {
        let tracker = Tracker::new();
        let keep = Uuid::new_v4();
        let gone = Uuid::new_v4();
        tracker.create(keep, details());
        tracker.create(gone, details());

        assert!(tracker.delete(gone).is_some());
        assert!(tracker.get(gone).is_none());
        assert!(tracker.list().iter().all(|j| j.id != gone));
        assert!(tracker.delete(gone).is_none());
        assert_eq!(tracker.list().len(), 1);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let tracker = Tracker::new();
        let ids: Vec<Uuid> = (0..20).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            tracker.create(*id, details());
        }
        // Updating an early job must not move it.
        tracker
            .update(ids[0], ParseStatus::Structuring, 50, "s")
            .unwrap();

        let listed: Vec<Uuid> = tracker.list().into_iter().map(|j| j.id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_evict_where_returns_removed_records() {
        let tracker = Tracker::new();
        let done = Uuid::new_v4();
        let running = Uuid::new_v4();
        tracker.create(done, details());
        tracker.create(running, details());
        tracker.update(done, ParseStatus::Success, 100, "ok").unwrap();

        let evicted = tracker.evict_where(|job| job.is_terminal());
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, done);
        assert!(tracker.get(running).is_some());
    }

    #[test]
    fn test_concurrent_updates_to_different_jobs_do_not_interfere() {
        let tracker = std::sync::Arc::new(Tracker::new());
        let ids: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            tracker.create(*id, details());
        }

        let threads: Vec<_> = ids
            .iter()
            .copied()
            .map(|id| {
                let tracker = tracker.clone();
                std::thread::spawn(move || {
                    for p in 0..=100u8 {
                        tracker
                            .update(id, ParseStatus::Extracting, p, format!("{id}:{p}"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        for id in ids {
            let job = tracker.get(id).unwrap();
            assert_eq!(job.progress, 100);
            assert_eq!(job.message, format!("{id}:100"));
        }
    }
}
