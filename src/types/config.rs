//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{
    CONCURRENCY_POLL_INTERVAL_MS, DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_RATE_LIMIT_DELAY_MS,
    RESPONSE_CACHE_CAPACITY, RESPONSE_CACHE_EVICTION_BATCH, SENTENCE_CACHE_CAPACITY,
    SENTENCE_CACHE_EVICTION_BATCH,
};

/// Configuration for the correction engine and its orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// API key for the completion endpoint; `None` leaves the client
    /// uninitialized and every operation fails fast
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion API
    pub api_base_url: String,

    /// Model identifier sent with every completion request
    pub model: String,

    /// Maximum completion calls in flight at once
    pub max_concurrent_requests: usize,

    /// Poll interval while waiting for a concurrency slot, in milliseconds
    pub concurrency_poll_interval_ms: u64,

    /// Debounce window for grammar correction requests, in milliseconds
    pub debounce_ms: u64,

    /// Debounce window for autocomplete requests, in milliseconds
    pub autocomplete_debounce_ms: u64,

    /// Delay applied to the last sentence of a correction, in milliseconds
    pub rate_limit_delay_ms: u64,

    /// Cache entry time-to-live in seconds
    pub cache_ttl_secs: u64,

    /// Response cache capacity and eviction batch size
    pub response_cache_capacity: usize,
    pub response_cache_eviction_batch: usize,

    /// Sentence cache capacity and eviction batch size
    pub sentence_cache_capacity: usize,
    pub sentence_cache_eviction_batch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-8b-8192".to_string(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            concurrency_poll_interval_ms: CONCURRENCY_POLL_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            autocomplete_debounce_ms: DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS,
            rate_limit_delay_ms: DEFAULT_RATE_LIMIT_DELAY_MS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            response_cache_capacity: RESPONSE_CACHE_CAPACITY,
            response_cache_eviction_batch: RESPONSE_CACHE_EVICTION_BATCH,
            sentence_cache_capacity: SENTENCE_CACHE_CAPACITY,
            sentence_cache_eviction_batch: SENTENCE_CACHE_EVICTION_BATCH,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("COMPLETION_API_KEY").ok(),
            api_base_url: std::env::var("COMPLETION_API_BASE_URL")
                .unwrap_or(defaults.api_base_url),
            model: std::env::var("COMPLETION_MODEL").unwrap_or(defaults.model),
            max_concurrent_requests: env_parse(
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            ),
            concurrency_poll_interval_ms: defaults.concurrency_poll_interval_ms,
            debounce_ms: env_parse("DEBOUNCE_MS", defaults.debounce_ms),
            autocomplete_debounce_ms: env_parse(
                "AUTOCOMPLETE_DEBOUNCE_MS",
                defaults.autocomplete_debounce_ms,
            ),
            rate_limit_delay_ms: env_parse("RATE_LIMIT_DELAY_MS", defaults.rate_limit_delay_ms),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            response_cache_capacity: defaults.response_cache_capacity,
            response_cache_eviction_batch: defaults.response_cache_eviction_batch,
            sentence_cache_capacity: defaults.sentence_cache_capacity,
            sentence_cache_eviction_batch: defaults.sentence_cache_eviction_batch,
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_concurrent_requests, 3);
        assert_eq!(config.rate_limit_delay_ms, 3000);
        assert_eq!(config.cache_ttl_secs, 1800);
        assert!(config.api_key.is_none());
    }
}
