//! Shared types for the correction engine.

pub mod config;
pub mod error;
pub mod options;
pub mod result;

pub use config::EngineConfig;
pub use error::EngineError;
pub use options::{CorrectionOptions, FixScope, Operation, Preferences};
pub use result::{
    AnswerResult, ContinuationResult, CorrectionResult, EngineStats, SentenceResult,
    SuggestionResult,
};
