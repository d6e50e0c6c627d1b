//! Static personal-website rendering of a persisted résumé record.

pub mod handlers;
pub mod theme;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::resume::{Education, ResumeRecord, Skill, SkillCategory, WorkExperience};
pub use theme::{ColorScheme, Template};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("color '{field}' must be a hex color (got '{value}')")]
    InvalidColor { field: &'static str, value: String },

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write site files: {0}")]
    Io(#[from] std::io::Error),
}

/// A generated site as persisted next to its record. The URL stays the same
/// across re-renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    pub website_id: Uuid,
    pub resume_id: Uuid,
    #[serde(rename = "template_id")]
    pub template: Template,
    #[serde(rename = "color_scheme")]
    pub colors: ColorScheme,
    pub is_public: bool,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebsiteConfig {
    pub fn new(
        resume_id: Uuid,
        template: Template,
        colors: ColorScheme,
        public_base_url: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let website_id = Uuid::new_v4();
        Self {
            website_id,
            resume_id,
            template,
            colors,
            is_public: true,
            url: site_url(public_base_url, website_id),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Where the static file service exposes a published site.
pub fn site_url(public_base_url: &str, website_id: Uuid) -> String {
    format!(
        "{}/websites/{website_id}/index.html",
        public_base_url.trim_end_matches('/')
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    pub path: String,
    pub contents: String,
}

pub trait SiteRenderer: Send + Sync {
    fn render(
        &self,
        record: &ResumeRecord,
        config: &WebsiteConfig,
    ) -> Result<Vec<SiteFile>, RenderError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSiteRenderer;

impl SiteRenderer for HtmlSiteRenderer {
    fn render(
        &self,
        record: &ResumeRecord,
        config: &WebsiteConfig,
    ) -> Result<Vec<SiteFile>, RenderError> {
        config.colors.validate()?;
        Ok(vec![
            SiteFile {
                path: "index.html".to_string(),
                contents: render_html(record, config.template),
            },
            SiteFile {
                path: "style.css".to_string(),
                contents: theme::stylesheet(config.template, &config.colors),
            },
            SiteFile {
                path: "resume.json".to_string(),
                contents: serde_json::to_string_pretty(record)?,
            },
        ])
    }
}

/// Writes rendered files under `{root}/{website_id}/` and returns that directory.
pub async fn publish_site(
    root: &Path,
    website_id: Uuid,
    files: &[SiteFile],
) -> Result<PathBuf, RenderError> {
    let dir = root.join(website_id.to_string());
    tokio::fs::create_dir_all(&dir).await?;
    for file in files {
        tokio::fs::write(dir.join(&file.path), &file.contents).await?;
    }
    info!(%website_id, files = files.len(), dir = %dir.display(), "Website published");
    Ok(dir)
}

/// Deletes `{root}/{website_id}/`. Returns `false` if it was already gone.
pub async fn remove_site(root: &Path, website_id: Uuid) -> Result<bool, RenderError> {
    match tokio::fs::remove_dir_all(root.join(website_id.to_string())).await {
        Ok(()) => {
            debug!(%website_id, "Website files removed");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Only http(s) links make it into an href; a bare host gets `https://` prepended.
fn safe_href(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(escape_html(trimmed))
    } else if !lower.contains(':') && !trimmed.is_empty() {
        Some(escape_html(&format!("https://{trimmed}")))
    } else {
        None
    }
}

fn render_html(record: &ResumeRecord, template: Template) -> String {
    let p = &record.personal_info;
    let name = escape_html(&p.name);

    let mut contact = String::new();
    let email = escape_html(&p.email);
    let _ = write!(
        contact,
        r#"<div class="contact-item"><a href="mailto:{email}">{email}</a></div>"#
    );
    for value in [&p.phone, &p.location].into_iter().flatten() {
        let _ = write!(
            contact,
            r#"<div class="contact-item"><span>{}</span></div>"#,
            escape_html(value)
        );
    }
    for (label, url) in [
        ("LinkedIn", &p.linkedin),
        ("GitHub", &p.github),
        ("Website", &p.website),
    ] {
        if let Some(href) = url.as_deref().and_then(safe_href) {
            let _ = write!(
                contact,
                r#"<div class="contact-item"><a href="{href}" target="_blank" rel="noopener">{label}</a></div>"#
            );
        }
    }

    let summary = p
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| section("About", &format!(r#"<p class="summary">{}</p>"#, escape_html(s))))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name}</title>
    <meta name="description" content="{name} - personal résumé">
    <meta name="generator" content="resumesite ({template})">
    <link rel="stylesheet" href="style.css">
</head>
<body class="template-{template}">
    <div class="container">
        <header class="header">
            <h1 class="name">{name}</h1>
            <div class="contact-info">{contact}</div>
        </header>
        <main class="main-content">
            {summary}
            {work}
            {education}
            {skills}
        </main>
        <footer class="footer">
            <p>&copy; {name}</p>
        </footer>
    </div>
</body>
</html>
"#,
        work = section("Experience", &work_html(&record.work_experience)),
        education = section("Education", &education_html(&record.education)),
        skills = section("Skills", &skills_html(&record.skills)),
    )
}

fn section(title: &str, body: &str) -> String {
    format!(
        r#"<section class="section"><h2 class="section-title">{title}</h2><div class="section-content">{body}</div></section>"#
    )
}

fn work_html(entries: &[WorkExperience]) -> String {
    if entries.is_empty() {
        return "<p>No work experience listed.</p>".to_string();
    }
    let mut html = String::new();
    for w in entries {
        let end = w.end_date.as_deref().unwrap_or("Present");
        let items: String = w
            .description
            .iter()
            .map(|d| format!("<li>{}</li>", escape_html(d)))
            .collect();
        let tech = w
            .technologies
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|t| {
                format!(
                    r#"<div class="technologies"><strong>Technologies:</strong> {}</div>"#,
                    escape_html(&t.join(", "))
                )
            })
            .unwrap_or_default();
        let _ = write!(
            html,
            r#"<div class="experience-item"><h3>{position}</h3><span class="company">{company}</span><span class="duration">{start} - {end}</span><ul class="experience-description">{items}</ul>{tech}</div>"#,
            position = escape_html(&w.position),
            company = escape_html(&w.company),
            start = escape_html(&w.start_date),
            end = escape_html(end),
        );
    }
    html
}

fn education_html(entries: &[Education]) -> String {
    if entries.is_empty() {
        return "<p>No education listed.</p>".to_string();
    }
    let mut html = String::new();
    for e in entries {
        let title = match &e.major {
            Some(major) => format!("{} - {}", escape_html(&e.degree), escape_html(major)),
            None => escape_html(&e.degree),
        };
        let gpa = e
            .gpa
            .as_deref()
            .map(|g| format!(" (GPA: {})", escape_html(g)))
            .unwrap_or_default();
        let _ = write!(
            html,
            r#"<div class="education-item"><h3>{title}</h3><span class="institution">{institution}</span><span class="duration">{start} - {end}{gpa}</span></div>"#,
            institution = escape_html(&e.institution),
            start = escape_html(&e.start_date),
            end = escape_html(e.end_date.as_deref().unwrap_or("Present")),
        );
    }
    html
}

fn skills_html(skills: &[Skill]) -> String {
    if skills.is_empty() {
        return "<p>No skills listed.</p>".to_string();
    }
    let mut by_category: BTreeMap<&'static str, Vec<&Skill>> = BTreeMap::new();
    for skill in skills {
        by_category
            .entry(skill.category.as_str())
            .or_default()
            .push(skill);
    }

    let mut html = String::new();
    for (category, skills) in by_category {
        let heading = match category {
            c if c == SkillCategory::Soft.as_str() => "Soft skills",
            c if c == SkillCategory::Language.as_str() => "Languages",
            _ => "Technical skills",
        };
        let tags: String = skills
            .iter()
            .map(|s| {
                let level = s
                    .level
                    .map(|l| format!(" ({})", l.as_str()))
                    .unwrap_or_default();
                format!(
                    r#"<span class="skill-tag">{}{level}</span>"#,
                    escape_html(&s.name)
                )
            })
            .collect();
        let _ = write!(
            html,
            r#"<div class="skills-category"><h4>{heading}</h4><div class="skills-list">{tags}</div></div>"#
        );
    }
    html
}
