pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::search::handlers;
use crate::state::AppState;

/// Room for the text fields and multipart framing on top of the resume itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // HTML pages
        .route("/", get(handlers::handle_form))
        .route("/searches", post(handlers::handle_submit))
        .route("/searches/:id", get(handlers::handle_search_page))
        .route("/searches/:id/cancel", post(handlers::handle_cancel_page))
        // Search API
        .route("/api/v1/searches", post(handlers::handle_api_submit))
        .route(
            "/api/v1/searches/:id",
            get(handlers::handle_api_status).delete(handlers::handle_api_cancel),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
