use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::render::{remove_site, WebsiteConfig};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ResumeWebsitesResponse {
    pub resume_id: Uuid,
    pub total: usize,
    pub websites: Vec<WebsiteConfig>,
}

pub(crate) async fn load_record(state: &AppState, id: Uuid) -> Result<ResumeRecord, AppError> {
    state
        .records
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// GET /api/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRecord>, AppError> {
    Ok(Json(load_record(&state, id).await?))
}

/// GET /api/resumes/:id/websites
pub async fn handle_list_resume_websites(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeWebsitesResponse>, AppError> {
    load_record(&state, id).await?;
    let websites = state.records.websites_for_resume(id).await?;
    Ok(Json(ResumeWebsitesResponse {
        resume_id: id,
        total: websites.len(),
        websites,
    }))
}

/// DELETE /api/resumes/:id
/// Takes every website generated from the record down with it.
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    load_record(&state, id).await?;

    let websites = state.records.websites_for_resume(id).await?;
    for website in &websites {
        remove_site(&state.config.site_output_dir, website.website_id).await?;
        state.records.delete_website(website).await?;
    }
    if !state.records.delete(id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }

    info!(resume_id = %id, websites = websites.len(), "Résumé deleted");
    Ok(StatusCode::NO_CONTENT)
}
