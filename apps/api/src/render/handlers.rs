use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::render::{publish_site, remove_site, ColorScheme, Template, WebsiteConfig};
use crate::resume::handlers::load_record;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WebsiteRequest {
    pub template_id: Option<String>,
    pub color_scheme: Option<ColorScheme>,
}

/// Fields left out keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct WebsiteUpdate {
    pub resume_id: Option<Uuid>,
    pub template_id: Option<String>,
    pub color_scheme: Option<ColorScheme>,
    pub is_public: Option<bool>,
}

#[derive(Serialize)]
pub struct WebsiteResponse {
    #[serde(flatten)]
    pub website: WebsiteConfig,
    pub files: Vec<String>,
}

async fn load_website(state: &AppState, id: Uuid) -> Result<WebsiteConfig, AppError> {
    state
        .records
        .get_website(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Website {id} not found")))
}

/// POST /api/resumes/:id/website
/// Renders a static site for the record, publishes it, and saves its config.
pub async fn handle_generate_website(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<WebsiteRequest>,
) -> Result<(StatusCode, Json<WebsiteResponse>), AppError> {
    let template = match req.template_id.as_deref() {
        Some(raw) => raw.parse::<Template>()?,
        None => Template::Modern,
    };
    let record = load_record(&state, id).await?;

    let website = WebsiteConfig::new(
        record.id,
        template,
        req.color_scheme.unwrap_or_else(|| template.default_colors()),
        &state.config.public_base_url,
        Utc::now(),
    );
    let files = state.renderer.render(&record, &website)?;
    let root = &state.config.site_output_dir;
    publish_site(root, website.website_id, &files).await?;

    if let Err(e) = state.records.save_website(&website).await {
        if let Err(err) = remove_site(root, website.website_id).await {
            warn!(website_id = %website.website_id, "Failed to remove unsaved site: {err}");
        }
        return Err(e.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(WebsiteResponse {
            website,
            files: files.into_iter().map(|f| f.path).collect(),
        }),
    ))
}

/// GET /api/websites/:id
pub async fn handle_get_website(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WebsiteConfig>, AppError> {
    Ok(Json(load_website(&state, id).await?))
}

/// PUT /api/websites/:id
/// Re-renders in place from the latest record. The URL never changes.
pub async fn handle_update_website(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<WebsiteUpdate>,
) -> Result<Json<WebsiteResponse>, AppError> {
    let previous = load_website(&state, id).await?;
    let mut website = previous.clone();

    if let Some(raw) = req.template_id.as_deref() {
        website.template = raw.parse()?;
    }
    if let Some(colors) = req.color_scheme {
        website.colors = colors;
    }
    if let Some(is_public) = req.is_public {
        website.is_public = is_public;
    }
    if let Some(resume_id) = req.resume_id {
        website.resume_id = resume_id;
    }
    website.updated_at = Utc::now();

    let record = load_record(&state, website.resume_id).await?;
    let files = state.renderer.render(&record, &website)?;
    publish_site(&state.config.site_output_dir, website.website_id, &files).await?;

    if previous.resume_id != website.resume_id {
        state.records.delete_website(&previous).await?;
    }
    state.records.save_website(&website).await?;
    info!(website_id = %id, template = website.template.as_str(), "Website updated");

    Ok(Json(WebsiteResponse {
        website,
        files: files.into_iter().map(|f| f.path).collect(),
    }))
}

/// DELETE /api/websites/:id
/// Removes the published files, then the config.
pub async fn handle_delete_website(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let website = load_website(&state, id).await?;
    remove_site(&state.config.site_output_dir, id).await?;
    state.records.delete_website(&website).await?;
    info!(website_id = %id, "Website deleted");
    Ok(StatusCode::NO_CONTENT)
}
