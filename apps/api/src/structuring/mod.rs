//! Turning cleaned résumé text into a structured JSON payload.
//!
//! The structurer returns raw JSON rather than a `ResumeDraft`: schema
//! conformance is the pipeline's Validating stage, not this one.

pub mod prompts;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum StructuringError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("no text to structure")]
    EmptyInput,

    #[error("model output is not a JSON object")]
    NotAnObject,
}

#[async_trait]
pub trait ResumeStructurer: Send + Sync {
    async fn structure(&self, text: &str) -> Result<Value, StructuringError>;
}

pub struct LlmResumeStructurer {
    llm: LlmClient,
}

impl LlmResumeStructurer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeStructurer for LlmResumeStructurer {
    async fn structure(&self, text: &str) -> Result<Value, StructuringError> {
        if text.trim().is_empty() {
            return Err(StructuringError::EmptyInput);
        }

        let prompt = prompts::build_structure_prompt(text);
        info!(text_chars = text.chars().count(), "Structuring résumé text");
        let payload: Value = self.llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?;

        let normalized = normalize_payload(payload)?;
        debug!("Structured payload normalized");
        Ok(normalized)
    }
}

const SKILL_CATEGORIES: &[&str] = &["technical", "soft", "language"];
const SKILL_LEVELS: &[&str] = &["beginner", "intermediate", "advanced", "expert"];

/// Cleans up model output before validation:
/// - work entries without company or position are dropped
/// - education entries without an institution are dropped
/// - skills without a name are dropped
/// - skill category and level are lower-cased; an unknown category becomes
///   `technical`, an unknown level becomes null
///
/// Missing sections are left missing so the pipeline can reject the payload.
pub fn normalize_payload(payload: Value) -> Result<Value, StructuringError> {
    let Value::Object(mut root) = payload else {
        return Err(StructuringError::NotAnObject);
    };

    retain_entries(&mut root, "work_experience", |e| {
        has_text(e, "company") && has_text(e, "position")
    });
    retain_entries(&mut root, "education", |e| has_text(e, "institution"));
    retain_entries(&mut root, "skills", |e| has_text(e, "name"));

    if let Some(Value::Array(skills)) = root.get_mut("skills") {
        for skill in skills.iter_mut().filter_map(Value::as_object_mut) {
            let category = lowered(skill.get("category"))
                .filter(|c| SKILL_CATEGORIES.contains(&c.as_str()))
                .unwrap_or_else(|| "technical".to_string());
            skill.insert("category".to_string(), Value::String(category));

            let level = lowered(skill.get("level"))
                .filter(|l| SKILL_LEVELS.contains(&l.as_str()))
                .map(Value::String)
                .unwrap_or(Value::Null);
            skill.insert("level".to_string(), level);
        }
    }

    Ok(Value::Object(root))
}

fn retain_entries(
    root: &mut Map<String, Value>,
    key: &str,
    keep: impl Fn(&Map<String, Value>) -> bool,
) {
    if let Some(Value::Array(entries)) = root.get_mut(key) {
        entries.retain(|e| e.as_object().is_some_and(&keep));
    }
}

fn has_text(entry: &Map<String, Value>, key: &str) -> bool {
    entry
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

fn lowered(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
}
