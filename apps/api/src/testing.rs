//! In-memory doubles for every pipeline collaborator, shared by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::{ArtifactBackend, Config};
use crate::extract::{ExtractionError, TextExtractor};
use crate::jobs::{ParseTracker, UploadDetails, UploadStatus, UploadTracker};
use crate::llm_client::LlmError;
use crate::models::resume::ResumeRecord;
use crate::render::WebsiteConfig;
use crate::pipeline::{ParsePipeline, PipelineSettings};
use crate::resume::store::{ResumeStore, StoreError};
use crate::storage::{ArtifactStore, MemoryArtifactStore};
use crate::structuring::{ResumeStructurer, StructuringError};

pub const RESUME_TEXT: &str = "Ada Lovelace\nada@example.com\n\
    Programmer at Analytical Engines Ltd, 1842-01 to present.\n\
    Wrote the first published algorithm for the Difference Engine.";

/// A tiny but structurally valid PDF header; the fakes never parse it.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n%%EOF\n";

pub fn minimal_payload() -> Value {
    json!({
        "personal_info": {"name": "Ada Lovelace", "email": "ada@example.com"},
        "work_experience": [],
        "education": [],
        "skills": []
    })
}

pub fn full_payload() -> Value {
    json!({
        "personal_info": {
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "location": "London",
            "summary": "Mathematician and the first programmer."
        },
        "work_experience": [{
            "company": "Analytical Engines Ltd",
            "position": "Programmer",
            "start_date": "1842-01",
            "description": ["Wrote the first published algorithm"],
            "technologies": ["Difference Engine"]
        }],
        "education": [{
            "institution": "University of London",
            "degree": "Private tutoring",
            "major": "Mathematics",
            "start_date": "1829-01"
        }],
        "skills": [
            {"category": "technical", "name": "Mathematics", "level": "expert"},
            {"category": "language", "name": "French", "level": null}
        ]
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Extractor
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeExtractor {
    text: Option<String>,
}

impl FakeExtractor {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract_text(&self, _pdf: Bytes) -> Result<String, ExtractionError> {
        self.text
            .clone()
            .ok_or_else(|| ExtractionError::Pdf("corrupt xref table".to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Structurer
// ────────────────────────────────────────────────────────────────────────────

pub enum StructurerScript {
    Payload(Value),
    Fail,
    Panic,
}

pub struct FakeStructurer {
    script: StructurerScript,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeStructurer {
    pub fn new(script: StructurerScript) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(payload: Value) -> Self {
        Self::new(StructurerScript::Payload(payload))
    }

    /// Sleeps before answering so tests can observe the structuring stage.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ResumeStructurer for FakeStructurer {
    async fn structure(&self, _text: &str) -> Result<Value, StructuringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.script {
            StructurerScript::Payload(v) => Ok(v.clone()),
            StructurerScript::Fail => Err(StructuringError::Llm(LlmError::Api {
                status: 400,
                message: "invalid request".to_string(),
            })),
            StructurerScript::Panic => panic!("structurer exploded"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Record store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryResumeStore {
    records: RwLock<HashMap<Uuid, ResumeRecord>>,
    websites: RwLock<HashMap<Uuid, WebsiteConfig>>,
    failures_left: AtomicUsize,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` saves fail.
    pub fn failing_saves(n: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn website_count(&self) -> usize {
        self.websites.read().unwrap().len()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn save(&self, record: &ResumeRecord) -> Result<Uuid, StoreError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StoreError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        self.records
            .write()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(record.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRecord>, StoreError> {
        Ok(self.records.read().unwrap().get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.records.write().unwrap().remove(&id).is_some())
    }

    async fn save_website(&self, website: &WebsiteConfig) -> Result<(), StoreError> {
        self.websites
            .write()
            .unwrap()
            .insert(website.website_id, website.clone());
        Ok(())
    }

    async fn get_website(&self, id: Uuid) -> Result<Option<WebsiteConfig>, StoreError> {
        Ok(self.websites.read().unwrap().get(&id).cloned())
    }

    async fn websites_for_resume(
        &self,
        resume_id: Uuid,
    ) -> Result<Vec<WebsiteConfig>, StoreError> {
        let mut found: Vec<WebsiteConfig> = self
            .websites
            .read()
            .unwrap()
            .values()
            .filter(|w| w.resume_id == resume_id)
            .cloned()
            .collect();
        found.sort_by_key(|w| w.created_at);
        Ok(found)
    }

    async fn delete_website(&self, website: &WebsiteConfig) -> Result<bool, StoreError> {
        Ok(self
            .websites
            .write()
            .unwrap()
            .remove(&website.website_id)
            .is_some())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wiring
// ────────────────────────────────────────────────────────────────────────────

pub struct Harness {
    pub pipeline: Arc<ParsePipeline>,
    pub parses: Arc<ParseTracker>,
    pub uploads: Arc<UploadTracker>,
    pub artifacts: Arc<MemoryArtifactStore>,
    pub records: Arc<MemoryResumeStore>,
    pub structurer: Arc<FakeStructurer>,
}

impl Harness {
    pub fn new(
        extractor: FakeExtractor,
        structurer: FakeStructurer,
        records: MemoryResumeStore,
    ) -> Self {
        let parses = Arc::new(ParseTracker::new());
        let uploads = Arc::new(UploadTracker::new());
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let records = Arc::new(records);
        let structurer = Arc::new(structurer);
        let pipeline = Arc::new(ParsePipeline::new(
            parses.clone(),
            uploads.clone(),
            artifacts.clone(),
            Arc::new(extractor),
            structurer.clone(),
            records.clone(),
            PipelineSettings::default(),
        ));
        Self {
            pipeline,
            parses,
            uploads,
            artifacts,
            records,
            structurer,
        }
    }

    /// Registers an upload that already reached `success` with its bytes stored.
    pub async fn stored_upload(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.uploads.create(
            id,
            UploadDetails {
                filename: "cv.pdf".to_string(),
                size_bytes: PDF_BYTES.len(),
                artifact: None,
                error_code: None,
            },
        );
        let artifact = self
            .artifacts
            .store(id, Bytes::from_static(PDF_BYTES))
            .await
            .unwrap();
        self.uploads
            .modify(id, |job| {
                job.status = UploadStatus::Success;
                job.progress = 100;
                job.details.artifact = Some(artifact);
            })
            .unwrap();
        id
    }
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        port: 0,
        rust_log: "debug".to_string(),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        anthropic_api_key: "test-key".to_string(),
        artifact_backend: ArtifactBackend::Memory,
        upload_dir: dir.join("uploads"),
        s3: None,
        max_upload_bytes: 10 * 1024 * 1024,
        site_output_dir: dir.join("sites"),
        public_base_url: "http://localhost:8080".to_string(),
        parse_min_text_chars: 50,
        job_ttl: None,
        job_sweep_interval: Duration::from_secs(300),
    }
}
