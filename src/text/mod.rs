//! Text analysis: sentence segmentation and language detection.

pub mod language;
pub mod segmenter;

pub use language::{available_languages, LanguageInfo, LanguageTag};
pub use segmenter::{segment, Sentence};
