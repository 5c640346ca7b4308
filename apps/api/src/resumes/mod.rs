pub mod handlers;
pub mod service;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use handlers::{get_only, post_only};

/// Routes mounted under `/api/v1/resumes`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(handlers::handle_create).fallback(post_only))
        .route("/upload", post(handlers::handle_upload).fallback(post_only))
        .route("/improve", post(handlers::handle_improve).fallback(post_only))
        .route("/tailor", post(handlers::handle_tailor).fallback(post_only))
        .route(
            "/ats-score",
            post(handlers::handle_ats_score).fallback(post_only),
        )
        .route(
            "/templates",
            get(handlers::handle_templates).fallback(get_only),
        )
        .route(
            "/preview/:template",
            get(handlers::handle_preview).fallback(get_only),
        )
        .route(
            "/export/:resume_id",
            get(handlers::handle_export).fallback(get_only),
        )
        .route(
            "/:resume_id",
            get(handlers::handle_get_resume).fallback(get_only),
        )
}
