//! The sentence-level grammar correction pipeline.
//!
//! Every sentence except the last is dispatched immediately through the
//! orchestrator's single-flight execution; the last sentence waits behind a
//! superseding delay because the user might still be typing it. Dispatch is
//! in original order, completions may land out of order, and reassembly waits
//! for all of them before joining in original order.

use std::cmp;
use std::sync::Arc;

use chrono::Utc;
use futures::future::{join_all, BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use super::{output, prompts, CachedResponse, CorrectionEngine};
use crate::cache::cache_key;
use crate::completion::CompletionRequest;
use crate::orchestrator::RequestOrchestrator;
use crate::text::language::LanguageTag;
use crate::text::segmenter;
use crate::types::{
    CorrectionOptions, CorrectionResult, EngineError, FixScope, Operation, SentenceResult,
};
use crate::MIN_CORRECTION_CHARS;

/// Where a sentence's corrected text comes from.
enum Slot {
    Cached(String),
    Pending(usize),
}

impl CorrectionEngine {
    /// Correct the grammar of `text`, sentence by sentence.
    ///
    /// Individual sentence failures never abort the whole operation; the
    /// original sentence text is substituted and the result still succeeds.
    pub async fn correct_grammar(
        &self,
        text: &str,
        options: &CorrectionOptions,
    ) -> Result<CorrectionResult, EngineError> {
        if !self.client.is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        if text.trim().chars().count() < MIN_CORRECTION_CHARS {
            return Ok(CorrectionResult::unchanged(
                text,
                LanguageTag::Unknown,
                self.model(),
            ));
        }

        let sentences = segmenter::segment(text);
        if sentences.is_empty() {
            return Ok(CorrectionResult::unchanged(
                text,
                LanguageTag::Unknown,
                self.model(),
            ));
        }

        debug!(count = sentences.len(), "segmented text for correction");

        let last = sentences.len() - 1;
        let mut slots = Vec::with_capacity(sentences.len());
        let mut languages = Vec::with_capacity(sentences.len());
        let mut futures: Vec<BoxFuture<'_, Result<String, EngineError>>> = Vec::new();

        for (i, sentence) in sentences.iter().enumerate() {
            let language = self.resolve_language(&sentence.text, options);
            languages.push(language);

            let key = sentence_key(language, options, &sentence.text);
            if let Some(cached) = self.sentence_cache.lock().unwrap().get(&key) {
                slots.push(Slot::Cached(cached));
                continue;
            }

            let request = CompletionRequest {
                model: self.model().to_string(),
                system_prompt: prompts::correction_prompt(language, options),
                user_prompt: sentence.text.clone(),
                max_tokens: cmp::min(500, sentence.text.chars().count() * 3) as u32,
                temperature: 0.1,
            };
            let client = Arc::clone(&self.client);
            let work = move || async move { client.complete(request).await };

            let fut: BoxFuture<'_, Result<String, EngineError>> = if i == last {
                // The user might still be typing the end of the message; a
                // newer request within the delay supersedes this one.
                let request_id = format!("last-sentence:{}", options.element_key());
                let delay = self.rate_limit_delay();
                async move { self.orchestrator.schedule(&request_id, delay, work).await }.boxed()
            } else {
                let request_id = RequestOrchestrator::request_id(
                    "sentence",
                    options.element_key(),
                    &sentence.text,
                );
                async move { self.orchestrator.execute(&request_id, work).await }.boxed()
            };

            slots.push(Slot::Pending(futures.len()));
            futures.push(fut);
        }

        let outcomes = join_all(futures).await;

        let mut sentence_results = Vec::with_capacity(sentences.len());
        let mut any_changes = false;
        let mut detected = LanguageTag::Unknown;

        for (i, slot) in slots.into_iter().enumerate() {
            let sentence = &sentences[i];
            let language = languages[i];
            if language != LanguageTag::Unknown {
                detected = language;
            }

            let result = match slot {
                Slot::Cached(corrected) => {
                    let has_changes = corrected != sentence.text;
                    SentenceResult {
                        original: sentence.text.clone(),
                        corrected,
                        language,
                        has_changes,
                        error: None,
                    }
                }
                Slot::Pending(idx) => match &outcomes[idx] {
                    Ok(raw) => self.accept_correction(&sentence.text, raw, language, options),
                    Err(EngineError::Superseded) => {
                        SentenceResult::unchanged(&sentence.text, language)
                    }
                    Err(e) => {
                        warn!(sentence = i, error = %e, "sentence correction failed, keeping original");
                        let mut unchanged = SentenceResult::unchanged(&sentence.text, language);
                        unchanged.error = Some(e.to_string());
                        unchanged
                    }
                },
            };

            if result.has_changes {
                any_changes = true;
            }
            sentence_results.push(result);
        }

        // Rejoining is lossy with respect to original inter-sentence
        // whitespace, so an unchanged result keeps the input verbatim and
        // `has_changes == (corrected != original)` holds exactly.
        let corrected = if any_changes {
            sentence_results
                .iter()
                .map(|s| s.corrected.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            text.to_string()
        };

        info!(
            sentences = sentences.len(),
            changes = any_changes,
            language = %detected,
            "grammar correction completed"
        );

        Ok(CorrectionResult {
            original: text.to_string(),
            corrected,
            has_changes: any_changes,
            detected_language: detected,
            sentence_count: sentences.len(),
            sentences: sentence_results,
            model: self.model().to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Whole-text spelling-only correction, without sentence segmentation.
    pub async fn quick_spelling_correction(
        &self,
        text: &str,
    ) -> Result<CorrectionResult, EngineError> {
        if !self.client.is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        if text.trim().chars().count() < MIN_CORRECTION_CHARS {
            return Ok(CorrectionResult::unchanged(
                text,
                LanguageTag::Unknown,
                self.model(),
            ));
        }

        let language = self.detect_language(text);
        let key = cache_key(Operation::Spelling.as_str(), language.as_str(), text);
        if let Some(CachedResponse::Correction(cached)) = self.cached_response(&key) {
            return Ok(cached);
        }

        let options = CorrectionOptions {
            fix_scope: FixScope::Spelling,
            ..Default::default()
        };
        let request = CompletionRequest {
            model: self.model().to_string(),
            system_prompt: prompts::correction_prompt(language, &options),
            user_prompt: text.to_string(),
            max_tokens: cmp::min(500, text.chars().count() * 3) as u32,
            temperature: 0.1,
        };
        let client = Arc::clone(&self.client);
        let request_id =
            RequestOrchestrator::request_id(Operation::Spelling.as_str(), "default", text);
        let raw = self
            .orchestrator
            .execute(&request_id, move || async move {
                client.complete(request).await
            })
            .await?;

        let cleaned = output::sanitize(&raw);
        let corrected = if cleaned.is_empty() || output::is_oversized(text, &cleaned) {
            text.to_string()
        } else {
            cleaned
        };

        let result = CorrectionResult {
            original: text.to_string(),
            has_changes: corrected != text,
            corrected,
            detected_language: language,
            sentence_count: 0,
            sentences: Vec::new(),
            model: self.model().to_string(),
            timestamp: Utc::now(),
        };
        self.store_response(&key, CachedResponse::Correction(result.clone()));
        Ok(result)
    }

    /// Post-process a raw completion for one sentence: sanitize, apply the
    /// oversize guard, and cache the accepted result.
    fn accept_correction(
        &self,
        original: &str,
        raw: &str,
        language: LanguageTag,
        options: &CorrectionOptions,
    ) -> SentenceResult {
        let cleaned = output::sanitize(raw);

        if cleaned.is_empty() {
            return SentenceResult::unchanged(original, language);
        }

        if output::is_oversized(original, &cleaned) {
            warn!(
                original_chars = original.chars().count(),
                corrected_chars = cleaned.chars().count(),
                "oversized correction discarded"
            );
            return SentenceResult::unchanged(original, language);
        }

        let key = sentence_key(language, options, original);
        self.sentence_cache.lock().unwrap().set(&key, cleaned.clone());

        SentenceResult {
            original: original.to_string(),
            has_changes: cleaned != original,
            corrected: cleaned,
            language,
            error: None,
        }
    }
}

/// Cache key for one sentence correction. Options participate so requests
/// that differ in translation policy or fix scope never share an entry.
fn sentence_key(language: LanguageTag, options: &CorrectionOptions, sentence: &str) -> String {
    let operation = format!(
        "{}:{}:{}",
        Operation::Grammar,
        options.allow_translation,
        options.fix_scope.as_str()
    );
    cache_key(&operation, language.as_str(), sentence)
}
