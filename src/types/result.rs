//! Result types returned by the correction engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::language::LanguageTag;

/// Outcome of correcting one sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceResult {
    pub original: String,
    pub corrected: String,
    pub language: LanguageTag,
    pub has_changes: bool,
    /// Set when this sentence's completion call failed and the original
    /// text was substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SentenceResult {
    /// An unchanged sentence, used for gated, superseded, or failed units.
    pub fn unchanged(sentence: &str, language: LanguageTag) -> Self {
        Self {
            original: sentence.to_string(),
            corrected: sentence.to_string(),
            language,
            has_changes: false,
            error: None,
        }
    }
}

/// Outcome of a whole-text grammar correction.
///
/// `has_changes == (corrected != original)` drives whether the caller mutates
/// the text surface at all, so it must hold exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub original: String,
    pub corrected: String,
    pub has_changes: bool,
    pub detected_language: LanguageTag,
    pub sentence_count: usize,
    /// Per-sentence breakdown, empty for short-circuited results
    pub sentences: Vec<SentenceResult>,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

impl CorrectionResult {
    /// A result that leaves the input untouched.
    pub fn unchanged(text: &str, language: LanguageTag, model: &str) -> Self {
        Self {
            original: text.to_string(),
            corrected: text.to_string(),
            has_changes: false,
            detected_language: language,
            sentence_count: 0,
            sentences: Vec::new(),
            model: model.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Autocomplete suggestions for the current input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub suggestions: Vec<String>,
    pub original: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Continuations offered after a completed sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationResult {
    pub continuations: Vec<String>,
    pub original: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// A short conversational answer to the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub original: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Engine counters exposed for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub cache_size: usize,
    pub sentence_cache_size: usize,
    pub pending_requests: usize,
    pub in_flight_requests: usize,
    pub active_requests: usize,
    pub max_concurrent_requests: usize,
    pub rate_limit_delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_result_invariant() {
        let result = CorrectionResult::unchanged("hello", LanguageTag::English, "test-model");
        assert_eq!(result.corrected, result.original);
        assert!(!result.has_changes);
        assert!(result.sentences.is_empty());
    }
}
