pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::presentation::handlers as pages;
use crate::rewrite::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Browser flow
        .route("/", get(pages::handle_index))
        .route("/rewrite", post(pages::handle_rewrite_page))
        // Rewrite API
        .route("/api/v1/resumes/extract", post(handlers::handle_extract))
        .route("/api/v1/resumes/rewrite", post(handlers::handle_rewrite))
        .route(
            "/api/v1/resumes/:session_id/download",
            get(handlers::handle_download),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
