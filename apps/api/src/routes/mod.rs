pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::pipeline::handlers as parse;
use crate::render::handlers as websites;
use crate::resume::handlers as resumes;
use crate::state::AppState;
use crate::upload::handlers as upload;

/// Room for multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let published_sites = ServeDir::new(&state.config.site_output_dir);

    Router::new()
        .route("/health", get(health::health_handler))
        // Uploads
        .route("/api/upload", post(upload::handle_upload))
        .route("/api/upload/:id/status", get(upload::handle_upload_status))
        .route("/api/upload/:id", delete(upload::handle_delete_upload))
        .route("/api/uploads", get(upload::handle_list_uploads))
        // Parse jobs
        .route("/api/parse/:id", post(parse::handle_start_parse))
        .route("/api/parse/:id/status", get(parse::handle_parse_status))
        .route("/api/parse/:id/retry", post(parse::handle_retry_parse))
        .route("/api/parse/:id", delete(parse::handle_delete_parse))
        .route("/api/parses", get(parse::handle_list_parses))
        // Records
        .route(
            "/api/resumes/:id",
            get(resumes::handle_get_resume).delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/resumes/:id/websites",
            get(resumes::handle_list_resume_websites),
        )
        // Websites
        .route(
            "/api/resumes/:id/website",
            post(websites::handle_generate_website),
        )
        .route(
            "/api/websites/:id",
            get(websites::handle_get_website)
                .put(websites::handle_update_website)
                .delete(websites::handle_delete_website),
        )
        .nest_service("/websites", published_sites)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
