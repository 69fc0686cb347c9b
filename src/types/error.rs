//! Error taxonomy for the correction engine.

use thiserror::Error;

/// Errors produced by the engine and orchestrator.
///
/// The type is `Clone` because in-flight work is shared between coalesced
/// callers; every caller of a deduplicated request observes the same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The completion client has no credential configured. Operations fail
    /// fast and are never retried.
    #[error("completion client is not initialized (missing API key)")]
    NotInitialized,

    /// A debounced request was replaced by a newer request for the same id
    /// before its timer fired. Callers treat this as "keep the original text".
    #[error("request superseded by a newer request for the same id")]
    Superseded,

    /// The completion endpoint failed. Per-sentence callers substitute the
    /// original sentence; whole-input callers propagate.
    #[error("completion request failed: {0}")]
    Completion(String),
}

impl EngineError {
    /// Whether the caller should silently fall back to the original text.
    pub fn is_fallback(&self) -> bool {
        matches!(self, EngineError::Superseded)
    }
}
