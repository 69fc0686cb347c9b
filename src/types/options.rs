//! Request options and user preferences.

use serde::{Deserialize, Serialize};

use crate::text::language::LanguageTag;

/// The kind of work a request performs. Part of every cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Grammar,
    Spelling,
    Autocomplete,
    Continuation,
    ShortAnswer,
}

impl Operation {
    /// Stable identifier used in cache keys and request ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Grammar => "grammar",
            Operation::Spelling => "spelling",
            Operation::Autocomplete => "autocomplete",
            Operation::Continuation => "continuation",
            Operation::ShortAnswer => "short_answer",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a correction is allowed to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixScope {
    Grammar,
    Spelling,
    Both,
}

impl FixScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixScope::Grammar => "grammar",
            FixScope::Spelling => "spelling",
            FixScope::Both => "both",
        }
    }
}

impl Default for FixScope {
    fn default() -> Self {
        FixScope::Both
    }
}

/// Per-call options for a correction request.
///
/// Operation, normalized text, and these options together determine a stable
/// cache key; two requests that differ in any of them never share an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionOptions {
    /// Explicit target language; `None` means auto-detect
    #[serde(default)]
    pub language: Option<LanguageTag>,

    /// Whether the model may translate to produce a natural correction.
    /// Off by default: unwanted translation is the dominant failure mode.
    #[serde(default)]
    pub allow_translation: bool,

    /// Keep the original meaning and tone exactly
    #[serde(default = "default_true")]
    pub preserve_meaning: bool,

    /// What to fix
    #[serde(default)]
    pub fix_scope: FixScope,

    /// Id of the editable element that owns this request, used to key
    /// debounce timers and single-flight deduplication
    #[serde(default)]
    pub element_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for CorrectionOptions {
    fn default() -> Self {
        Self {
            language: None,
            allow_translation: false,
            preserve_meaning: true,
            fix_scope: FixScope::default(),
            element_id: None,
        }
    }
}

impl CorrectionOptions {
    /// The element id to key timers with, falling back to a shared default.
    pub fn element_key(&self) -> &str {
        self.element_id.as_deref().unwrap_or("default")
    }

    /// Build options from stored user preferences.
    pub fn from_preferences(prefs: &Preferences) -> Self {
        let language = match prefs.default_language.as_str() {
            "auto" => None,
            other => match LanguageTag::from_str(other) {
                LanguageTag::Unknown => None,
                tag => Some(tag),
            },
        };
        Self {
            language,
            allow_translation: prefs.allow_translation,
            preserve_meaning: prefs.preserve_meaning,
            fix_scope: prefs.fix_scope,
            element_id: None,
        }
    }
}

/// User preferences as persisted by the (external) storage collaborator.
/// The core never reads storage itself; callers pass this in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Target language code, or "auto"
    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default)]
    pub allow_translation: bool,

    #[serde(default)]
    pub fix_scope: FixScope,

    #[serde(default = "default_true")]
    pub preserve_meaning: bool,

    /// Named feature preset selected in the settings surface
    #[serde(default = "default_preset")]
    pub preset_mode: String,

    /// Delay applied to last-sentence corrections, in milliseconds
    #[serde(default = "default_rate_limit")]
    pub rate_limit_delay_ms: u64,
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_preset() -> String {
    "full".to_string()
}

fn default_rate_limit() -> u64 {
    crate::DEFAULT_RATE_LIMIT_DELAY_MS
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            allow_translation: false,
            fix_scope: FixScope::default(),
            preserve_meaning: true,
            preset_mode: default_preset(),
            rate_limit_delay_ms: default_rate_limit(),
        }
    }
}
