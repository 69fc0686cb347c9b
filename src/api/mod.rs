//! HTTP surface for the correction service.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use handlers::AppState;

/// Build the service router over the shared application state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/correct", post(handlers::correct))
        .route("/correct/quick-spelling", post(handlers::quick_spelling))
        .route("/autocomplete", post(handlers::autocomplete))
        .route("/continuations", post(handlers::continuations))
        .route("/answer", post(handlers::answer))
        .route("/detect", post(handlers::detect_language))
        .route("/languages", get(handlers::list_languages))
        .route("/stats", get(handlers::get_stats))
        .route("/cache/clear", post(handlers::clear_cache))
        .route("/cancel", post(handlers::cancel_element))
        .route("/settings", put(handlers::update_settings))
        .with_state(state)
}
