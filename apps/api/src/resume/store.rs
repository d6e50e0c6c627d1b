//! Persistence of validated résumé records.
//!
//! Redis layout:
//! - `resume:{id}`: the record as a JSON string
//! - `resumes:all`: set of every record id
//! - `resume:text:{id}`: hash `{content, created_at, name, email}` for text search
//! - `skills:{category}` / `resume:skills:{id}`: skill name sets
//! - `companies:all` / `resume:companies:{id}`: company name sets
//! - `website:{id}`: a generated site's config as a JSON string
//! - `resume:websites:{resume_id}` / `websites:all`: website id sets
//!
//! Every write goes out as one MULTI/EXEC pipeline.

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::resume::ResumeRecord;
use crate::render::WebsiteConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Persists the record and returns the id it was stored under.
    async fn save(&self, record: &ResumeRecord) -> Result<Uuid, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRecord>, StoreError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Inserts or overwrites a website config and indexes it under its record.
    async fn save_website(&self, website: &WebsiteConfig) -> Result<(), StoreError>;

    async fn get_website(&self, id: Uuid) -> Result<Option<WebsiteConfig>, StoreError>;

    async fn websites_for_resume(&self, resume_id: Uuid)
        -> Result<Vec<WebsiteConfig>, StoreError>;

    /// Drops the config and its index entries. Returns `false` if it was already gone.
    async fn delete_website(&self, website: &WebsiteConfig) -> Result<bool, StoreError>;
}

const ALL_RESUMES_KEY: &str = "resumes:all";
const ALL_COMPANIES_KEY: &str = "companies:all";
const ALL_WEBSITES_KEY: &str = "websites:all";

fn record_key(id: Uuid) -> String {
    format!("resume:{id}")
}

fn text_key(id: Uuid) -> String {
    format!("resume:text:{id}")
}

fn record_skills_key(id: Uuid) -> String {
    format!("resume:skills:{id}")
}

fn record_companies_key(id: Uuid) -> String {
    format!("resume:companies:{id}")
}

fn website_key(id: Uuid) -> String {
    format!("website:{id}")
}

fn record_websites_key(resume_id: Uuid) -> String {
    format!("resume:websites:{resume_id}")
}

/// Flattened searchable text: name, summary, location, then work, education and skills.
pub fn search_text(record: &ResumeRecord) -> String {
    let p = &record.personal_info;
    let mut parts: Vec<&str> = vec![
        p.name.as_str(),
        p.summary.as_deref().unwrap_or_default(),
        p.location.as_deref().unwrap_or_default(),
    ];
    for w in &record.work_experience {
        parts.push(&w.company);
        parts.push(&w.position);
        parts.extend(w.description.iter().map(String::as_str));
        if let Some(tech) = &w.technologies {
            parts.extend(tech.iter().map(String::as_str));
        }
    }
    for e in &record.education {
        parts.push(&e.institution);
        parts.push(&e.degree);
        parts.push(e.major.as_deref().unwrap_or_default());
    }
    parts.extend(record.skills.iter().map(|s| s.name.as_str()));

    parts
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct RedisResumeStore {
    client: redis::Client,
}

impl RedisResumeStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

fn save_pipeline(record: &ResumeRecord) -> Result<redis::Pipeline, StoreError> {
    let id = record.id;
    let json = serde_json::to_string(record)?;

    let mut pipe = redis::pipe();
    pipe.atomic()
        .set(record_key(id), json)
        .ignore()
        .sadd(ALL_RESUMES_KEY, id.to_string())
        .ignore()
        .hset_multiple(
            text_key(id),
            &[
                ("content", search_text(record)),
                ("created_at", record.created_at.to_rfc3339()),
                ("name", record.personal_info.name.clone()),
                ("email", record.personal_info.email.clone()),
            ],
        )
        .ignore();

    for skill in &record.skills {
        pipe.sadd(format!("skills:{}", skill.category.as_str()), &skill.name)
            .ignore()
            .sadd(record_skills_key(id), &skill.name)
            .ignore();
    }
    for work in &record.work_experience {
        pipe.sadd(ALL_COMPANIES_KEY, &work.company)
            .ignore()
            .sadd(record_companies_key(id), &work.company)
            .ignore();
    }
    Ok(pipe)
}

/// Replies with a single count: how many record keys were removed.
fn delete_pipeline(id: Uuid) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .del(record_key(id))
        .del(vec![
            text_key(id),
            record_skills_key(id),
            record_companies_key(id),
            record_websites_key(id),
        ])
        .ignore()
        .srem(ALL_RESUMES_KEY, id.to_string())
        .ignore();
    pipe
}

fn save_website_pipeline(website: &WebsiteConfig) -> Result<redis::Pipeline, StoreError> {
    let id = website.website_id.to_string();
    let json = serde_json::to_string(website)?;

    let mut pipe = redis::pipe();
    pipe.atomic()
        .set(website_key(website.website_id), json)
        .ignore()
        .sadd(record_websites_key(website.resume_id), &id)
        .ignore()
        .sadd(ALL_WEBSITES_KEY, &id)
        .ignore();
    Ok(pipe)
}

/// Replies with a single count: how many config keys were removed.
fn delete_website_pipeline(website: &WebsiteConfig) -> redis::Pipeline {
    let id = website.website_id.to_string();
    let mut pipe = redis::pipe();
    pipe.atomic()
        .del(website_key(website.website_id))
        .srem(record_websites_key(website.resume_id), &id)
        .ignore()
        .srem(ALL_WEBSITES_KEY, &id)
        .ignore();
    pipe
}

#[async_trait]
impl ResumeStore for RedisResumeStore {
    async fn save(&self, record: &ResumeRecord) -> Result<Uuid, StoreError> {
        let pipe = save_pipeline(record)?;
        let mut conn = self.connection().await?;
        pipe.query_async::<_, ()>(&mut conn).await?;

        info!(resume_id = %record.id, "Résumé saved");
        Ok(record.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRecord>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(record_key(id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => {
                debug!(resume_id = %id, "Résumé not found");
                Ok(None)
            }
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let (removed,): (u32,) = delete_pipeline(id).query_async(&mut conn).await?;

        if removed > 0 {
            info!(resume_id = %id, "Résumé deleted");
        }
        Ok(removed > 0)
    }

    async fn save_website(&self, website: &WebsiteConfig) -> Result<(), StoreError> {
        let pipe = save_website_pipeline(website)?;
        let mut conn = self.connection().await?;
        pipe.query_async::<_, ()>(&mut conn).await?;

        info!(
            website_id = %website.website_id,
            resume_id = %website.resume_id,
            "Website config saved"
        );
        Ok(())
    }

    async fn get_website(&self, id: Uuid) -> Result<Option<WebsiteConfig>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(website_key(id)).await?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    async fn websites_for_resume(
        &self,
        resume_id: Uuid,
    ) -> Result<Vec<WebsiteConfig>, StoreError> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn.smembers(record_websites_key(resume_id)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| format!("website:{id}")).collect();
        let raw: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        let mut websites = raw
            .into_iter()
            .flatten()
            .map(|json| serde_json::from_str::<WebsiteConfig>(&json))
            .collect::<Result<Vec<_>, _>>()?;
        websites.sort_by_key(|w| w.created_at);
        Ok(websites)
    }

    async fn delete_website(&self, website: &WebsiteConfig) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let (removed,): (u32,) = delete_website_pipeline(website)
            .query_async(&mut conn)
            .await?;

        if removed > 0 {
            info!(website_id = %website.website_id, "Website config deleted");
        }
        Ok(removed > 0)
    }
}
