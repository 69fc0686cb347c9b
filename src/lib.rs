//! Corrector Service Library
//!
//! An AI-backed grammar correction and writing-assist engine. Segments free
//! text into sentences, schedules and deduplicates per-sentence completion
//! requests, detects language without network calls, and merges corrections
//! back into a result the caller can apply to a live text surface.

pub mod api;
pub mod cache;
pub mod completion;
pub mod engine;
pub mod orchestrator;
pub mod text;
pub mod types;

pub use completion::{CompletionClient, CompletionRequest, HttpCompletionClient};
pub use engine::CorrectionEngine;
pub use orchestrator::RequestOrchestrator;
pub use text::language::LanguageTag;
pub use text::segmenter::{segment, Sentence};
pub use types::{CorrectionOptions, CorrectionResult, EngineConfig, EngineError, FixScope};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::completion::{CompletionClient, CompletionRequest};
    pub use crate::engine::CorrectionEngine;
    pub use crate::orchestrator::RequestOrchestrator;
    pub use crate::text::language::LanguageTag;
    pub use crate::types::*;
}

/// Cache entry time-to-live in seconds (30 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30 * 60;

/// Maximum entries in the response cache before eviction
pub const RESPONSE_CACHE_CAPACITY: usize = 100;

/// Entries removed from the response cache per eviction pass
pub const RESPONSE_CACHE_EVICTION_BATCH: usize = 20;

/// Maximum entries in the sentence cache before eviction
pub const SENTENCE_CACHE_CAPACITY: usize = 200;

/// Entries removed from the sentence cache per eviction pass
pub const SENTENCE_CACHE_EVICTION_BATCH: usize = 50;

/// Delay applied to the last sentence of a correction, in milliseconds
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 3000;

/// Debounce window for grammar correction requests, in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

/// Debounce window for autocomplete requests, in milliseconds
pub const DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS: u64 = 500;

/// Maximum completion calls in flight at once
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 3;

/// Poll interval while waiting for a concurrency slot, in milliseconds
pub const CONCURRENCY_POLL_INTERVAL_MS: u64 = 100;

/// Minimum text length (chars) for grammar correction
pub const MIN_CORRECTION_CHARS: usize = 3;

/// Minimum text length (chars) for autocomplete
pub const MIN_AUTOCOMPLETE_CHARS: usize = 2;

/// Number of sentence continuations requested per call
pub const CONTINUATION_COUNT: usize = 3;

/// A correction longer than this multiple of the original is discarded
pub const MAX_CORRECTION_LENGTH_RATIO: usize = 2;
