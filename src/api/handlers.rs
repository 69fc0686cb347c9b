//! HTTP request handlers for the correction service.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::CorrectionEngine;
use crate::text::language::{self, LanguageTag};
use crate::types::{
    AnswerResult, ContinuationResult, CorrectionOptions, CorrectionResult, EngineError,
    EngineStats, SuggestionResult,
};

/// Application state shared across handlers.
pub struct AppState {
    pub engine: Arc<CorrectionEngine>,
}

fn error_status(error: EngineError) -> StatusCode {
    match error {
        EngineError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Superseded => StatusCode::CONFLICT,
        EngineError::Completion(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Grammar correction request.
#[derive(Debug, Deserialize)]
pub struct CorrectRequest {
    pub text: String,
    #[serde(default)]
    pub options: CorrectionOptions,
}

/// Correct the grammar of the submitted text.
pub async fn correct(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CorrectRequest>,
) -> Result<Json<CorrectionResult>, StatusCode> {
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        chars = request.text.chars().count(),
        element = request.options.element_key(),
        "received correction request"
    );

    state
        .engine
        .correct_grammar(&request.text, &request.options)
        .await
        .map(Json)
        .map_err(error_status)
}

/// Quick spelling request.
#[derive(Debug, Deserialize)]
pub struct QuickSpellingRequest {
    pub text: String,
}

/// Spelling-only correction of the whole text, without segmentation.
pub async fn quick_spelling(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuickSpellingRequest>,
) -> Result<Json<CorrectionResult>, StatusCode> {
    state
        .engine
        .quick_spelling_correction(&request.text)
        .await
        .map(Json)
        .map_err(error_status)
}

/// Autocomplete request.
#[derive(Debug, Deserialize)]
pub struct AutocompleteRequest {
    pub text: String,
    #[serde(default)]
    pub context: String,
    #[serde(default = "default_element")]
    pub element_id: String,
}

fn default_element() -> String {
    "default".to_string()
}

/// Debounced autocomplete. A newer request for the same element within the
/// debounce window supersedes this one, which then answers 409.
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AutocompleteRequest>,
) -> Result<Json<SuggestionResult>, StatusCode> {
    state
        .engine
        .request_autocomplete(&request.element_id, &request.text, &request.context)
        .await
        .map(Json)
        .map_err(error_status)
}

/// Continuation request.
#[derive(Debug, Deserialize)]
pub struct ContinuationRequest {
    pub text: String,
    #[serde(default)]
    pub context: String,
}

/// Offer continuations after a completed sentence.
pub async fn continuations(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContinuationRequest>,
) -> Result<Json<ContinuationResult>, StatusCode> {
    state
        .engine
        .sentence_continuations(&request.text, &request.context)
        .await
        .map(Json)
        .map_err(error_status)
}

/// Short answer request.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

/// Answer a question or statement conversationally.
pub async fn answer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResult>, StatusCode> {
    state
        .engine
        .short_answer(&request.text)
        .await
        .map(Json)
        .map_err(error_status)
}

/// Language detection request.
#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub text: String,
}

/// Language detection response.
#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub language: LanguageTag,
}

/// Detect the language of the submitted text. Purely heuristic, no
/// completion call is made.
pub async fn detect_language(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DetectRequest>,
) -> Json<DetectResponse> {
    Json(DetectResponse {
        language: state.engine.detect_language(&request.text),
    })
}

/// List the languages a user can select as a correction target.
pub async fn list_languages() -> Json<Vec<language::LanguageInfo>> {
    Json(language::available_languages())
}

/// Engine counters.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<EngineStats> {
    Json(state.engine.stats())
}

/// Cache clear response.
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: bool,
}

/// Clear both caches and cancel pending work.
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<ClearCacheResponse> {
    state.engine.clear_cache();
    Json(ClearCacheResponse { cleared: true })
}

/// Cancellation request for one editable element.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub element_id: String,
}

/// Cancellation response.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

/// Cancel pending debounced work for one element, e.g. when its tab closes.
pub async fn cancel_element(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CancelRequest>,
) -> Json<CancelResponse> {
    state.engine.cancel_element(&request.element_id);
    Json(CancelResponse { cancelled: true })
}

/// Runtime settings update. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub rate_limit_delay_ms: Option<u64>,
    pub max_concurrent_requests: Option<usize>,
}

/// Adjust throttling knobs at runtime; responds with the resulting stats.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Json<EngineStats> {
    if let Some(delay_ms) = request.rate_limit_delay_ms {
        state.engine.set_rate_limit_delay(delay_ms);
    }
    if let Some(max) = request.max_concurrent_requests {
        state.engine.set_max_concurrent_requests(max);
    }
    Json(state.engine.stats())
}
