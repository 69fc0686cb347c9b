//! Output hygiene for model responses.
//!
//! Models wrap answers in quotes or prepend boilerplate ("Here is the
//! corrected text:"). Stripping is mandatory post-processing: unstripped
//! artifacts corrupt the changed/unchanged comparison and the user-visible
//! text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Boilerplate prefixes models prepend despite instructions.
    static ref BOILERPLATE_PREFIX: Regex = Regex::new(
        r"(?i)^(here\s+is(\s+the)?(\s+corrected)?(\s+text|\s+sentence|\s+version)?\s*:\s*|here's(\s+the)?(\s+corrected)?(\s+text|\s+sentence|\s+version)?\s*:\s*|the\s+corrected\s+(text|sentence)\s+is\s*:?\s*|corrected\s+(text|sentence)\s*:\s*|the\s+completion\s+is\s*:?\s*|suggestion\s*:\s*)"
    )
    .expect("invalid boilerplate regex");
}

/// Clean a raw model response for comparison and application.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(m) = BOILERPLATE_PREFIX.find(text) {
        text = &text[m.end()..];
    }

    text.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '[' | ']' | '{' | '}'))
        .trim()
        .to_string()
}

/// Whether a correction is implausibly long relative to its input. An
/// oversized response is treated as a model failure (runaway translation or
/// hallucinated elaboration), not a valid edit.
pub fn is_oversized(original: &str, corrected: &str) -> bool {
    corrected.chars().count() > crate::MAX_CORRECTION_LENGTH_RATIO * original.chars().count()
}
