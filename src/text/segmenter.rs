//! Sentence segmentation with punctuation and script-aware boundaries.
//!
//! A boundary is sentence-ending punctuation (`.!?` or CJK `。！？`) followed
//! by whitespace and, for the Latin case, an uppercase letter or a non-Latin
//! script start character. Requiring the capital avoids splitting on
//! abbreviations followed by lowercase continuations ("e.g. this").
//!
//! Rejoining segments uses a single space; exact original inter-sentence
//! whitespace is not round-tripped. This is accepted lossy behavior.

/// A contiguous sentence within a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Sentence text with surrounding whitespace trimmed
    pub text: String,
    /// Char offset of the sentence start within the parent text
    pub index: usize,
    /// Whether the sentence was followed by whitespace in the original text
    pub had_trailing_space: bool,
}

/// Split `text` into sentences.
///
/// Empty or whitespace-only input yields an empty vec. Text without terminal
/// punctuation yields a single sentence.
pub fn segment(text: &str) -> Vec<Sentence> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut current_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        current.push(c);

        let latin_terminator = matches!(c, '.' | '!' | '?');
        let cjk_terminator = matches!(c, '。' | '！' | '？');

        if latin_terminator || cjk_terminator {
            // Look past any whitespace run following the terminator.
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let had_whitespace = j > i + 1;

            let is_boundary = if j >= chars.len() {
                true
            } else if cjk_terminator {
                // CJK terminators end sentences with or without whitespace.
                true
            } else {
                had_whitespace && starts_new_sentence(chars[j])
            };

            if is_boundary {
                push_sentence(&mut sentences, &current, current_start, had_whitespace);
                current.clear();
                current_start = j;
                i = j;
                continue;
            }
        }

        i += 1;
    }

    // Trailing fragment without terminal punctuation.
    push_sentence(&mut sentences, &current, current_start, false);

    sentences
}

/// Whether a character can open a new sentence after a Latin terminator.
fn starts_new_sentence(c: char) -> bool {
    if c.is_uppercase() {
        return true;
    }
    matches!(
        c as u32,
        0x4E00..=0x9FFF      // Han
        | 0x0400..=0x04FF    // Cyrillic
        | 0x0600..=0x06FF    // Arabic
        | 0x3040..=0x309F    // Hiragana
        | 0x30A0..=0x30FF    // Katakana
        | 0xAC00..=0xD7AF    // Hangul
    )
}

fn push_sentence(sentences: &mut Vec<Sentence>, raw: &str, raw_start: usize, trailing: bool) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let leading_ws = raw.chars().take_while(|c| c.is_whitespace()).count();
    sentences.push(Sentence {
        text: trimmed.to_string(),
        index: raw_start + leading_ws,
        had_trailing_space: trailing,
    });
}
