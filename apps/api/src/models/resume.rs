//! The structured résumé record produced by the parse pipeline.
//!
//! `ResumeDraft` is what the structuring stage hands over (no id, no timestamps);
//! `ResumeRecord` is the validated, persisted form.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Technical,
    Soft,
    Language,
}

impl SkillCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Technical => "technical",
            SkillCategory::Soft => "soft",
            SkillCategory::Language => "language",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Expert => "expert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub description: Vec<String>,
    #[serde(default)]
    pub technologies: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub major: Option<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub category: SkillCategory,
    pub name: String,
    #[serde(default)]
    pub level: Option<SkillLevel>,
}

/// Structured output before it has an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeDraft {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeDraft {
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> ResumeRecord {
        ResumeRecord {
            id,
            personal_info: self.personal_info,
            work_experience: self.work_experience,
            education: self.education,
            skills: self.skills,
            created_at: now,
            updated_at: now,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email regex is valid")
});

/// Field rules:
/// - name 1–100, email a valid address, phone ≤20, location ≤100, summary ≤500
/// - work: company 1–100, position 1–100, start_date present, at least one description line
/// - education: institution 1–100, degree 1–50, start_date present, major ≤100, gpa ≤10
/// - skills: name 1–50
pub fn validate_draft(draft: &ResumeDraft) -> Vec<FieldViolation> {
    let mut v = Violations::default();

    let p = &draft.personal_info;
    v.required("personal_info.name", &p.name, 100);
    if !EMAIL_RE.is_match(p.email.trim()) {
        v.push("personal_info.email", "must be a valid email address");
    }
    v.optional("personal_info.phone", p.phone.as_deref(), 20);
    v.optional("personal_info.location", p.location.as_deref(), 100);
    v.optional("personal_info.summary", p.summary.as_deref(), 500);

    for (i, w) in draft.work_experience.iter().enumerate() {
        let at = |f: &str| format!("work_experience[{i}].{f}");
        v.required(&at("company"), &w.company, 100);
        v.required(&at("position"), &w.position, 100);
        v.required(&at("start_date"), &w.start_date, usize::MAX);
        if w.description.iter().all(|d| d.trim().is_empty()) {
            v.push(&at("description"), "must contain at least one item");
        }
    }

    for (i, e) in draft.education.iter().enumerate() {
        let at = |f: &str| format!("education[{i}].{f}");
        v.required(&at("institution"), &e.institution, 100);
        v.required(&at("degree"), &e.degree, 50);
        v.required(&at("start_date"), &e.start_date, usize::MAX);
        v.optional(&at("major"), e.major.as_deref(), 100);
        v.optional(&at("gpa"), e.gpa.as_deref(), 10);
    }

    for (i, s) in draft.skills.iter().enumerate() {
        v.required(&format!("skills[{i}].name"), &s.name, 50);
    }

    v.0
}

/// The predicate every persisted record satisfies.
pub fn validate_record(record: &ResumeRecord) -> Vec<FieldViolation> {
    let as_draft = ResumeDraft {
        personal_info: record.personal_info.clone(),
        work_experience: record.work_experience.clone(),
        education: record.education.clone(),
        skills: record.skills.clone(),
    };
    let mut violations = validate_draft(&as_draft);
    if record.id.is_nil() {
        violations.push(FieldViolation {
            field: "id".to_string(),
            reason: "must not be nil".to_string(),
        });
    }
    violations
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &str, reason: &str) {
        self.0.push(FieldViolation {
            field: field.to_string(),
            reason: reason.to_string(),
        });
    }

    fn required(&mut self, field: &str, value: &str, max_chars: usize) {
        let len = value.trim().chars().count();
        if len == 0 {
            self.push(field, "is required");
        } else if len > max_chars {
            self.push(field, &format!("must be at most {max_chars} characters"));
        }
    }

    fn optional(&mut self, field: &str, value: Option<&str>, max_chars: usize) {
        if let Some(value) = value {
            if value.chars().count() > max_chars {
                self.push(field, &format!("must be at most {max_chars} characters"));
            }
        }
    }
}
