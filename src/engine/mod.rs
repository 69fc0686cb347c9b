//! The correction engine: the top-level API for grammar correction,
//! autocomplete, sentence continuations, and short answers.
//!
//! The engine composes the sentence segmenter, language heuristic, response
//! caches, and completion client, and routes all network-bound work through
//! the request orchestrator. It owns its caches and timers exclusively; one
//! instance exists per process.

pub mod output;
pub mod prompts;

mod correction;
mod suggestions;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use crate::cache::TtlCache;
use crate::completion::CompletionClient;
use crate::orchestrator::RequestOrchestrator;
use crate::text::language::{self, LanguageTag};
use crate::types::{
    AnswerResult, ContinuationResult, CorrectionOptions, CorrectionResult, EngineConfig,
    EngineError, EngineStats, Operation, Preferences, SuggestionResult,
};

/// Values stored in the whole-response cache.
#[derive(Debug, Clone)]
enum CachedResponse {
    Correction(CorrectionResult),
    Suggestions(SuggestionResult),
    Continuations(ContinuationResult),
    Answer(AnswerResult),
}

/// Top-level correction engine. See the module docs.
pub struct CorrectionEngine {
    client: Arc<dyn CompletionClient>,
    orchestrator: RequestOrchestrator,
    response_cache: Mutex<TtlCache<CachedResponse>>,
    sentence_cache: Mutex<TtlCache<String>>,
    config: EngineConfig,
    rate_limit_delay_ms: AtomicU64,
}

impl CorrectionEngine {
    /// Create an engine around the given completion client.
    pub fn new(client: Arc<dyn CompletionClient>, config: EngineConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        Self {
            orchestrator: RequestOrchestrator::new(
                config.max_concurrent_requests,
                Duration::from_millis(config.concurrency_poll_interval_ms),
            ),
            response_cache: Mutex::new(TtlCache::new(
                ttl,
                config.response_cache_capacity,
                config.response_cache_eviction_batch,
            )),
            sentence_cache: Mutex::new(TtlCache::new(
                ttl,
                config.sentence_cache_capacity,
                config.sentence_cache_eviction_batch,
            )),
            rate_limit_delay_ms: AtomicU64::new(config.rate_limit_delay_ms),
            client,
            config,
        }
    }

    /// Detect the language of `text` without any network call.
    pub fn detect_language(&self, text: &str) -> LanguageTag {
        language::detect(text)
    }

    /// Resolve the target language: explicit user choice wins, otherwise
    /// auto-detect on the given text.
    pub(crate) fn resolve_language(&self, text: &str, options: &CorrectionOptions) -> LanguageTag {
        match options.language {
            Some(tag) => tag,
            None => language::detect(text),
        }
    }

    /// Debounced grammar correction for an editable element. Keystrokes that
    /// arrive within the debounce window supersede earlier ones.
    pub async fn request_grammar_correction(
        self: &Arc<Self>,
        text: &str,
        options: CorrectionOptions,
    ) -> Result<CorrectionResult, EngineError> {
        // Keyed by element only: a newer keystroke in the same element must
        // supersede the pending request even though the text differs.
        let request_id = format!("{}:{}", Operation::Grammar, options.element_key());
        let engine = Arc::clone(self);
        let text = text.to_string();
        self.orchestrator
            .schedule(
                &request_id,
                Duration::from_millis(self.config.debounce_ms),
                move || async move { engine.correct_grammar(&text, &options).await },
            )
            .await
    }

    /// Debounced autocomplete for an editable element. Uses a shorter window
    /// than grammar correction since suggestions race the user's typing.
    pub async fn request_autocomplete(
        self: &Arc<Self>,
        element_id: &str,
        text: &str,
        context: &str,
    ) -> Result<SuggestionResult, EngineError> {
        let request_id = format!("{}:{}", Operation::Autocomplete, element_id);
        let engine = Arc::clone(self);
        let text = text.to_string();
        let context = context.to_string();
        self.orchestrator
            .schedule(
                &request_id,
                Duration::from_millis(self.config.autocomplete_debounce_ms),
                move || async move { engine.autocomplete_suggestions(&text, &context).await },
            )
            .await
    }

    /// Correct grammar using stored user preferences, with optional per-call
    /// overrides applied by the caller before invoking.
    pub async fn correct_grammar_with_preferences(
        &self,
        text: &str,
        prefs: &Preferences,
    ) -> Result<CorrectionResult, EngineError> {
        let options = CorrectionOptions::from_preferences(prefs);
        self.correct_grammar(text, &options).await
    }

    /// Cancel pending debounced work for one editable element, e.g. when its
    /// tab closes. In-flight completion calls are not abortable.
    pub fn cancel_element(&self, element_id: &str) {
        self.orchestrator.cancel_element(element_id);
    }

    /// Clear both caches and cancel all pending debounce timers.
    pub fn clear_cache(&self) {
        self.response_cache.lock().unwrap().clear();
        self.sentence_cache.lock().unwrap().clear();
        self.orchestrator.cancel_all();
        info!("caches cleared");
    }

    /// Update the last-sentence delay at runtime.
    pub fn set_rate_limit_delay(&self, delay_ms: u64) {
        self.rate_limit_delay_ms.store(delay_ms, Ordering::SeqCst);
        info!(delay_ms, "rate limit delay updated");
    }

    /// Update the concurrency cap at runtime.
    pub fn set_max_concurrent_requests(&self, max: usize) {
        self.orchestrator.set_max_concurrent(max);
    }

    pub(crate) fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms.load(Ordering::SeqCst))
    }

    /// Engine counters for diagnostics.
    pub fn stats(&self) -> EngineStats {
        let orchestrator = self.orchestrator.stats();
        EngineStats {
            cache_size: self.response_cache.lock().unwrap().len(),
            sentence_cache_size: self.sentence_cache.lock().unwrap().len(),
            pending_requests: orchestrator.pending_requests,
            in_flight_requests: orchestrator.in_flight_requests,
            active_requests: orchestrator.active_requests,
            max_concurrent_requests: orchestrator.max_concurrent_requests,
            rate_limit_delay_ms: self.rate_limit_delay_ms.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn model(&self) -> &str {
        &self.config.model
    }

    fn cached_response(&self, key: &str) -> Option<CachedResponse> {
        self.response_cache.lock().unwrap().get(key)
    }

    fn store_response(&self, key: &str, value: CachedResponse) {
        self.response_cache.lock().unwrap().set(key, value);
    }
}
