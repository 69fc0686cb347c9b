//! Heuristic language detection.
//!
//! Detection is synchronous and side-effect-free by design: choosing a prompt
//! language must never cost a network round-trip. Non-Latin scripts are
//! identified by Unicode ranges (highly reliable); Latin-script text is scored
//! against per-language stop-word lists, with a character-distribution
//! fallback when the scores are ambiguous.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Languages the engine can detect or be targeted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    English,
    Portuguese,
    Spanish,
    French,
    German,
    Italian,
    Romanian,
    Turkish,
    Russian,
    Chinese,
    Japanese,
    Korean,
    Arabic,
    Unknown,
}

impl LanguageTag {
    /// Get a string representation of the language.
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::English => "english",
            LanguageTag::Portuguese => "portuguese",
            LanguageTag::Spanish => "spanish",
            LanguageTag::French => "french",
            LanguageTag::German => "german",
            LanguageTag::Italian => "italian",
            LanguageTag::Romanian => "romanian",
            LanguageTag::Turkish => "turkish",
            LanguageTag::Russian => "russian",
            LanguageTag::Chinese => "chinese",
            LanguageTag::Japanese => "japanese",
            LanguageTag::Korean => "korean",
            LanguageTag::Arabic => "arabic",
            LanguageTag::Unknown => "unknown",
        }
    }

    /// Get the language from a string identifier.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "english" | "en" => LanguageTag::English,
            "portuguese" | "pt" => LanguageTag::Portuguese,
            "spanish" | "es" => LanguageTag::Spanish,
            "french" | "fr" => LanguageTag::French,
            "german" | "de" => LanguageTag::German,
            "italian" | "it" => LanguageTag::Italian,
            "romanian" | "ro" => LanguageTag::Romanian,
            "turkish" | "tr" => LanguageTag::Turkish,
            "russian" | "ru" => LanguageTag::Russian,
            "chinese" | "zh" => LanguageTag::Chinese,
            "japanese" | "ja" => LanguageTag::Japanese,
            "korean" | "ko" => LanguageTag::Korean,
            "arabic" | "ar" => LanguageTag::Arabic,
            _ => LanguageTag::Unknown,
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display info for a selectable target language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
}

/// Languages a user can select as a correction target, including auto-detect.
pub fn available_languages() -> Vec<LanguageInfo> {
    let mut langs = vec![LanguageInfo {
        code: "auto".to_string(),
        name: "Auto-detect".to_string(),
    }];
    for tag in [
        LanguageTag::English,
        LanguageTag::Portuguese,
        LanguageTag::Spanish,
        LanguageTag::French,
        LanguageTag::German,
        LanguageTag::Italian,
        LanguageTag::Romanian,
        LanguageTag::Turkish,
        LanguageTag::Russian,
        LanguageTag::Chinese,
        LanguageTag::Japanese,
        LanguageTag::Korean,
        LanguageTag::Arabic,
    ] {
        let code = tag.as_str();
        let name = format!("{}{}", code[..1].to_uppercase(), &code[1..]);
        langs.push(LanguageInfo {
            code: code.to_string(),
            name,
        });
    }
    langs
}

/// English stop words for majority-word scoring.
const ENGLISH_STOPWORDS: &[&str] = &[
    "the", "and", "is", "are", "you", "but", "not", "a", "i", "to", "this", "that", "with", "for",
    "on", "at", "by", "from", "as", "an", "be", "or", "will", "can", "have", "has", "had", "do",
    "does", "did", "would", "could", "should", "may", "might", "must", "shall", "of", "in", "it",
    "he", "she", "we", "they", "me", "him", "her", "us", "them",
];

const PORTUGUESE_STOPWORDS: &[&str] = &[
    "e", "é", "não", "mas", "eu", "você", "um", "uma", "para", "isso", "com", "por", "de", "da",
    "do", "na", "no", "em", "se", "que", "o", "a", "os", "as", "ele", "ela", "eles", "elas",
    "meu", "minha", "seu", "sua", "nosso", "nossa",
];

const SPANISH_STOPWORDS: &[&str] = &[
    "y", "es", "no", "pero", "yo", "tú", "un", "una", "para", "esto", "con", "por", "de", "la",
    "el", "en", "se", "que", "los", "las", "él", "ella", "ellos", "ellas", "mi", "tu", "su",
    "nuestro", "nuestra",
];

const FRENCH_STOPWORDS: &[&str] = &[
    "et", "est", "ne", "pas", "mais", "je", "tu", "vous", "un", "une", "pour", "ceci", "avec",
    "par", "de", "la", "le", "dans", "se", "que", "les", "il", "elle", "ils", "elles", "mon",
    "ton", "son", "notre", "votre",
];

/// Detect the language of `text`.
///
/// Never fails; empty or whitespace-only input returns [`LanguageTag::Unknown`].
pub fn detect(text: &str) -> LanguageTag {
    if text.trim().is_empty() {
        return LanguageTag::Unknown;
    }

    if let Some(tag) = detect_by_script(text) {
        return tag;
    }

    let lowered = text.to_lowercase();
    let words: HashSet<&str> = lowered.unicode_words().collect();

    let mut scores = [
        (LanguageTag::English, score_words(&words, ENGLISH_STOPWORDS)),
        (
            LanguageTag::Portuguese,
            score_words(&words, PORTUGUESE_STOPWORDS),
        ),
        (LanguageTag::Spanish, score_words(&words, SPANISH_STOPWORDS)),
        (LanguageTag::French, score_words(&words, FRENCH_STOPWORDS)),
    ];
    scores.sort_by(|a, b| b.1.cmp(&a.1));

    let (top_lang, top_score) = scores[0];
    let (_, second_score) = scores[1];

    // A zero or near-tied top score means the stop-word signal is too weak.
    if top_score == 0 || top_score - second_score <= 1 {
        return if is_mostly_english(text) {
            LanguageTag::English
        } else {
            LanguageTag::Unknown
        };
    }

    top_lang
}

/// Detect by non-Latin script ranges. Scripts are mutually exclusive and
/// highly reliable, so the first matching script class wins.
///
/// Kana takes priority over Han so Japanese text containing kanji is not
/// misread as Chinese; pure-Han text classifies as Chinese.
fn detect_by_script(text: &str) -> Option<LanguageTag> {
    let mut has_kana = false;
    let mut has_hangul = false;
    let mut has_cyrillic = false;
    let mut has_arabic = false;
    let mut has_han = false;

    for c in text.chars() {
        match c as u32 {
            0x3040..=0x30FF => has_kana = true,
            0x3005 | 0x3006 | 0x3024 => has_kana = true,
            0xAC00..=0xD7AF => has_hangul = true,
            0x0400..=0x04FF => has_cyrillic = true,
            0x0600..=0x06FF => has_arabic = true,
            0x4E00..=0x9FFF => has_han = true,
            _ => {}
        }
    }

    if has_kana {
        Some(LanguageTag::Japanese)
    } else if has_hangul {
        Some(LanguageTag::Korean)
    } else if has_cyrillic {
        Some(LanguageTag::Russian)
    } else if has_arabic {
        Some(LanguageTag::Arabic)
    } else if has_han {
        Some(LanguageTag::Chinese)
    } else {
        None
    }
}

/// Count how many of the given stop words appear in the text's word set.
fn score_words(words: &HashSet<&str>, stopwords: &[&str]) -> usize {
    stopwords.iter().filter(|w| words.contains(*w)).count()
}

/// Character-distribution fallback: enough Latin letters and a low
/// non-ASCII ratio is taken as English.
fn is_mostly_english(text: &str) -> bool {
    let latin_count = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let non_ascii_count = text.chars().filter(|c| !c.is_ascii()).count();

    latin_count > 5 && (non_ascii_count as f64) / (latin_count as f64) < 0.2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_unknown() {
        assert_eq!(detect(""), LanguageTag::Unknown);
        assert_eq!(detect("   \n\t"), LanguageTag::Unknown);
    }

    #[test]
    fn test_script_detection() {
        assert_eq!(detect("これはテストです"), LanguageTag::Japanese);
        assert_eq!(detect("안녕하세요 반갑습니다"), LanguageTag::Korean);
        assert_eq!(detect("Привет, как дела?"), LanguageTag::Russian);
        assert_eq!(detect("مرحبا كيف حالك"), LanguageTag::Arabic);
        assert_eq!(detect("这是一个测试"), LanguageTag::Chinese);
    }

    #[test]
    fn test_kanji_with_kana_is_japanese() {
        assert_eq!(detect("日本語を勉強しています"), LanguageTag::Japanese);
    }

    #[test]
    fn test_script_wins_over_stopwords() {
        // Latin stop words mixed with Cyrillic still classify by script.
        assert_eq!(
            detect("the and is are Привет мир"),
            LanguageTag::Russian
        );
    }

    #[test]
    fn test_english_stopword_scoring() {
        assert_eq!(
            detect("the quick brown fox is in the garden and it has a bone"),
            LanguageTag::English
        );
    }

    #[test]
    fn test_french_stopword_scoring() {
        assert_eq!(
            detect("je ne sais pas mais il est dans le jardin avec elle"),
            LanguageTag::French
        );
    }

    #[test]
    fn test_portuguese_stopword_scoring() {
        assert_eq!(
            detect("eu não sei mas ele está na casa com a minha irmã e você"),
            LanguageTag::Portuguese
        );
    }

    #[test]
    fn test_ambiguous_latin_falls_back_to_english() {
        // No stop-word hits at all, but plenty of ASCII letters.
        assert_eq!(detect("zxqwv plmgh brfds kjtrn"), LanguageTag::English);
    }

    #[test]
    fn test_ambiguous_short_input_is_unknown() {
        assert_eq!(detect("ab"), LanguageTag::Unknown);
    }

    #[test]
    fn test_tag_round_trip() {
        assert_eq!(LanguageTag::from_str("french"), LanguageTag::French);
        assert_eq!(LanguageTag::from_str("pt"), LanguageTag::Portuguese);
        assert_eq!(LanguageTag::from_str("klingon"), LanguageTag::Unknown);
        assert_eq!(LanguageTag::French.as_str(), "french");
    }

    #[test]
    fn test_available_languages_includes_auto() {
        let langs = available_languages();
        assert_eq!(langs[0].code, "auto");
        assert!(langs.iter().any(|l| l.code == "japanese"));
        assert_eq!(langs.len(), 14);
    }
}
