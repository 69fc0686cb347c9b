//! Autocomplete suggestions, sentence continuations, and short answers.
//!
//! These operations send the whole input in one completion call, so they use
//! the response cache directly rather than the per-sentence cache.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::{output, prompts, CachedResponse, CorrectionEngine};
use crate::cache::cache_key;
use crate::completion::CompletionRequest;
use crate::orchestrator::RequestOrchestrator;
use crate::types::{AnswerResult, ContinuationResult, EngineError, Operation, SuggestionResult};
use crate::{CONTINUATION_COUNT, MIN_AUTOCOMPLETE_CHARS, MIN_CORRECTION_CHARS};

/// A suggestion longer than this is a runaway completion, not an autocomplete.
const MAX_SUGGESTION_CHARS: usize = 100;

const SHORT_ANSWER_GUIDANCE: &str =
    "Please type a longer question or statement to get an answer.";

impl CorrectionEngine {
    /// Produce at most one completion suggestion for the text being typed.
    ///
    /// `context` is surrounding text (e.g. the message being replied to) and
    /// may be empty. Unusable model output yields an empty suggestion list,
    /// never an error.
    pub async fn autocomplete_suggestions(
        &self,
        text: &str,
        context: &str,
    ) -> Result<SuggestionResult, EngineError> {
        if !self.client.is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        if text.trim().chars().count() < MIN_AUTOCOMPLETE_CHARS {
            return Ok(self.suggestion_result(text, Vec::new()));
        }

        let key = cache_key(
            Operation::Autocomplete.as_str(),
            "any",
            &format!("{}|{}", text, context),
        );
        if let Some(CachedResponse::Suggestions(cached)) = self.cached_response(&key) {
            debug!("autocomplete cache hit");
            return Ok(cached);
        }

        let user_prompt = if context.trim().is_empty() {
            format!("Complete this text: {}", text)
        } else {
            format!("Context: {}\n\nComplete this text: {}", context, text)
        };
        let raw = self
            .run_completion(
                Operation::Autocomplete,
                &user_prompt,
                CompletionRequest {
                    model: self.model().to_string(),
                    system_prompt: prompts::autocomplete_prompt(),
                    user_prompt: user_prompt.clone(),
                    max_tokens: 50,
                    temperature: 0.3,
                },
            )
            .await?;

        let cleaned = output::sanitize(&raw);
        let suggestions = if cleaned.is_empty() || cleaned.chars().count() > MAX_SUGGESTION_CHARS {
            warn!(
                chars = cleaned.chars().count(),
                "discarding unusable autocomplete suggestion"
            );
            Vec::new()
        } else {
            vec![cleaned]
        };

        let result = self.suggestion_result(text, suggestions);
        self.store_response(&key, CachedResponse::Suggestions(result.clone()));
        Ok(result)
    }

    /// Offer distinct ways the text could continue after a finished sentence.
    pub async fn sentence_continuations(
        &self,
        text: &str,
        context: &str,
    ) -> Result<ContinuationResult, EngineError> {
        if !self.client.is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        if text.trim().chars().count() < MIN_CORRECTION_CHARS {
            return Ok(self.continuation_result(text, Vec::new()));
        }

        let key = cache_key(
            Operation::Continuation.as_str(),
            "any",
            &format!("{}|{}", text, context),
        );
        if let Some(CachedResponse::Continuations(cached)) = self.cached_response(&key) {
            return Ok(cached);
        }

        let user_prompt = if context.trim().is_empty() {
            text.to_string()
        } else {
            format!("Context: {}\n\nText: {}", context, text)
        };
        let raw = self
            .run_completion(
                Operation::Continuation,
                &user_prompt,
                CompletionRequest {
                    model: self.model().to_string(),
                    system_prompt: prompts::continuation_prompt(CONTINUATION_COUNT),
                    user_prompt: user_prompt.clone(),
                    max_tokens: 150,
                    temperature: 0.7,
                },
            )
            .await?;

        let mut continuations = parse_tagged(&raw, CONTINUATION_COUNT);
        if continuations.is_empty() {
            continuations = parse_lines(&raw);
        }
        continuations.truncate(CONTINUATION_COUNT);

        let result = self.continuation_result(text, continuations);
        self.store_response(&key, CachedResponse::Continuations(result.clone()));
        Ok(result)
    }

    /// A short conversational answer to a question or statement.
    pub async fn short_answer(&self, text: &str) -> Result<AnswerResult, EngineError> {
        if !self.client.is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        if text.trim().chars().count() < MIN_CORRECTION_CHARS {
            return Ok(self.answer_result(text, SHORT_ANSWER_GUIDANCE.to_string()));
        }

        let key = cache_key(Operation::ShortAnswer.as_str(), "any", text);
        if let Some(CachedResponse::Answer(cached)) = self.cached_response(&key) {
            return Ok(cached);
        }

        let raw = self
            .run_completion(
                Operation::ShortAnswer,
                text,
                CompletionRequest {
                    model: self.model().to_string(),
                    system_prompt: prompts::short_answer_prompt(),
                    user_prompt: text.to_string(),
                    max_tokens: 200,
                    temperature: 0.7,
                },
            )
            .await?;

        let answer = output::sanitize(&raw);
        let result = self.answer_result(text, answer);
        self.store_response(&key, CachedResponse::Answer(result.clone()));
        Ok(result)
    }

    /// Single-flight completion call shared by the whole-text operations.
    async fn run_completion(
        &self,
        operation: Operation,
        dedup_text: &str,
        request: CompletionRequest,
    ) -> Result<String, EngineError> {
        let request_id = RequestOrchestrator::request_id(operation.as_str(), "default", dedup_text);
        let client = Arc::clone(&self.client);
        self.orchestrator
            .execute(&request_id, move || async move {
                client.complete(request).await
            })
            .await
    }

    fn suggestion_result(&self, text: &str, suggestions: Vec<String>) -> SuggestionResult {
        SuggestionResult {
            suggestions,
            original: text.to_string(),
            model: self.model().to_string(),
            timestamp: Utc::now(),
        }
    }

    fn continuation_result(&self, text: &str, continuations: Vec<String>) -> ContinuationResult {
        ContinuationResult {
            continuations,
            original: text.to_string(),
            model: self.model().to_string(),
            timestamp: Utc::now(),
        }
    }

    fn answer_result(&self, text: &str, answer: String) -> AnswerResult {
        AnswerResult {
            answer,
            original: text.to_string(),
            model: self.model().to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Extract `OPTION_n:`-tagged continuations in tag order.
fn parse_tagged(raw: &str, count: usize) -> Vec<String> {
    let mut out = Vec::new();
    for i in 1..=count {
        let tag = format!("OPTION_{}:", i);
        let Some(start) = raw.find(&tag) else { continue };
        let rest = &raw[start + tag.len()..];
        let end = (i + 1..=count)
            .filter_map(|j| rest.find(&format!("OPTION_{}:", j)))
            .min()
            .unwrap_or(rest.len());
        let candidate = output::sanitize(&rest[..end]);
        if !candidate.is_empty() {
            out.push(candidate);
        }
    }
    out
}

/// Fallback for models that ignore the tag format: one continuation per
/// non-empty line, with list markers stripped.
fn parse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.trim_start_matches(['-', '*', '•']);
            let line = match line.split_once('.') {
                Some((prefix, rest)) if prefix.chars().all(|c| c.is_ascii_digit()) => rest,
                _ => line,
            };
            output::sanitize(line)
        })
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::stub::StubCompletionClient;
    use crate::types::EngineConfig;
    use pretty_assertions::assert_eq;

    fn engine_with(stub: Arc<StubCompletionClient>) -> Arc<CorrectionEngine> {
        Arc::new(CorrectionEngine::new(stub, EngineConfig::default()))
    }

    #[test]
    fn test_parse_tagged_in_order() {
        let raw = "OPTION_1: and then we left.\nOPTION_2: but it rained.\nOPTION_3: so we stayed.";
        assert_eq!(
            parse_tagged(raw, 3),
            vec!["and then we left.", "but it rained.", "so we stayed."]
        );
    }

    #[test]
    fn test_parse_tagged_skips_missing_tags() {
        let raw = "OPTION_1: and then we left.\nOPTION_3: so we stayed.";
        assert_eq!(
            parse_tagged(raw, 3),
            vec!["and then we left.", "so we stayed."]
        );
    }

    #[test]
    fn test_parse_lines_strips_list_markers() {
        let raw = "- and then we left.\n2. but it rained.\n\n* so we stayed.";
        assert_eq!(
            parse_lines(raw),
            vec!["and then we left.", "but it rained.", "so we stayed."]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_autocomplete_gate_skips_completion() {
        let stub = Arc::new(StubCompletionClient::new());
        let engine = engine_with(Arc::clone(&stub));

        let result = engine.autocomplete_suggestions("a", "").await.unwrap();

        assert!(result.suggestions.is_empty());
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autocomplete_suggestion_cached() {
        let stub = Arc::new(StubCompletionClient::new());
        stub.respond("Complete this text: I was walking", "down the street.");
        let engine = engine_with(Arc::clone(&stub));

        let first = engine
            .autocomplete_suggestions("I was walking", "")
            .await
            .unwrap();
        let second = engine
            .autocomplete_suggestions("I was walking", "")
            .await
            .unwrap();

        assert_eq!(first.suggestions, vec!["down the street."]);
        assert_eq!(second.suggestions, first.suggestions);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runaway_suggestion_discarded() {
        let stub = Arc::new(StubCompletionClient::new());
        stub.respond("Complete this text: I was walking", &"x".repeat(150));
        let engine = engine_with(Arc::clone(&stub));

        let result = engine
            .autocomplete_suggestions("I was walking", "")
            .await
            .unwrap();

        assert!(result.suggestions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuations_parse_tagged_output() {
        let stub = Arc::new(StubCompletionClient::new());
        stub.respond(
            "The meeting went well.",
            "OPTION_1: We should do it again.\nOPTION_2: Everyone agreed quickly.\nOPTION_3: Notes are attached.",
        );
        let engine = engine_with(Arc::clone(&stub));

        let result = engine
            .sentence_continuations("The meeting went well.", "")
            .await
            .unwrap();

        assert_eq!(result.continuations.len(), 3);
        assert_eq!(result.continuations[0], "We should do it again.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_continuations_line_fallback() {
        let stub = Arc::new(StubCompletionClient::new());
        stub.respond(
            "The meeting went well.",
            "- We should do it again.\n- Everyone agreed quickly.",
        );
        let engine = engine_with(Arc::clone(&stub));

        let result = engine
            .sentence_continuations("The meeting went well.", "")
            .await
            .unwrap();

        assert_eq!(
            result.continuations,
            vec!["We should do it again.", "Everyone agreed quickly."]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_answer_gate_returns_guidance() {
        let stub = Arc::new(StubCompletionClient::new());
        let engine = engine_with(Arc::clone(&stub));

        let result = engine.short_answer("ok").await.unwrap();

        assert_eq!(result.answer, SHORT_ANSWER_GUIDANCE);
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_answer_cached() {
        let stub = Arc::new(StubCompletionClient::new());
        stub.respond("What time is the standup?", "The standup is at 9:30 every weekday morning.");
        let engine = engine_with(Arc::clone(&stub));

        let first = engine.short_answer("What time is the standup?").await.unwrap();
        let second = engine.short_answer("What time is the standup?").await.unwrap();

        assert_eq!(first.answer, "The standup is at 9:30 every weekday morning.");
        assert_eq!(second.answer, first.answer);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_autocomplete_supersedes_older_text() {
        let stub = Arc::new(StubCompletionClient::new());
        stub.respond("Complete this text: I was walking", "down the street.");
        let engine = engine_with(Arc::clone(&stub));

        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.request_autocomplete("field-1", "I was", "").await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let second = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .request_autocomplete("field-1", "I was walking", "")
                    .await
            })
        };

        let first = first.await.unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(first.unwrap_err(), EngineError::Superseded);
        assert_eq!(second.suggestions, vec!["down the street."]);
        assert_eq!(stub.call_count(), 1);
    }
}
