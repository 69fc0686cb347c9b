//! Prompt construction for the completion client.
//!
//! The language, translation, and scope parameters are embedded verbatim in
//! the instruction text. The dominant observed failure mode is unwanted
//! translation, so "same language in, same language out" is enforced through
//! prompt design rather than post-hoc filtering.

use crate::text::language::LanguageTag;
use crate::types::{CorrectionOptions, FixScope};

/// Build the system prompt for a grammar/spelling correction.
pub fn correction_prompt(language: LanguageTag, options: &CorrectionOptions) -> String {
    let mut prompt = String::from(
        "You are a grammar corrector. Your ONLY job is to fix issues WITHOUT \
         changing the meaning or structure.\n\n",
    );

    prompt.push_str(&format!("Language: {}\n", language));
    if options.allow_translation {
        prompt.push_str("You MAY translate if needed to correct the sentence naturally.\n");
    } else {
        prompt.push_str("DO NOT translate. DO NOT assume a different language.\n");
    }
    if options.preserve_meaning {
        prompt.push_str("Preserve the original meaning and tone exactly.\n");
    }

    prompt.push_str("\nTasks:");
    if matches!(options.fix_scope, FixScope::Grammar | FixScope::Both) {
        prompt.push_str("\n- Fix grammar mistakes");
    }
    if matches!(options.fix_scope, FixScope::Spelling | FixScope::Both) {
        prompt.push_str("\n- Fix spelling errors");
    }

    prompt.push_str("\n\nOnly output the corrected sentence in the same language.");

    match language {
        LanguageTag::English => prompt.push_str(
            "\n\nCRITICAL: This is ENGLISH text. Do not translate words like \
             \"senior\", \"resume\", \"actual\", \"fiesta\" - these are English \
             sentences with international words.",
        ),
        LanguageTag::Portuguese => prompt.push_str(
            "\n\nCRITICAL: This is PORTUGUESE text. Maintain Portuguese grammar and vocabulary.",
        ),
        LanguageTag::Spanish => prompt.push_str(
            "\n\nCRITICAL: This is SPANISH text. Maintain Spanish grammar and vocabulary.",
        ),
        LanguageTag::French => prompt.push_str(
            "\n\nCRITICAL: This is FRENCH text. Maintain French grammar and vocabulary.",
        ),
        other => prompt.push_str(&format!(
            "\n\nCRITICAL: Maintain the original language ({}). Do not translate.",
            other
        )),
    }

    prompt
}

/// System prompt for single-suggestion autocomplete.
pub fn autocomplete_prompt() -> String {
    "You are a multilingual intelligent autocomplete assistant. Your task is to:\n\
     1. Provide ONLY ONE best completion for the given text\n\
     2. Keep the completion concise and contextually appropriate (max 10-15 words)\n\
     3. Return ONLY the completion text, no JSON, no quotes, no explanations\n\
     4. Complete the current sentence or thought naturally\n\
     5. Maintain the same writing style and tone\n\
     6. CRITICAL: Respond in the SAME language as the input text\n\
     7. DO NOT translate - keep the original language"
        .to_string()
}

/// System prompt for tagged sentence continuations.
pub fn continuation_prompt(count: usize) -> String {
    let mut prompt = format!(
        "You are a writing assistant. The user has just completed a sentence. \
         Offer exactly {} distinct ways the text could continue.\n\n\
         Output format, one per line:\n",
        count
    );
    for i in 1..=count {
        prompt.push_str(&format!("OPTION_{}: <continuation>\n", i));
    }
    prompt.push_str(
        "\nRules:\n\
         - Each continuation is one short sentence (max 15 words)\n\
         - No explanations, no numbering other than the OPTION_ tags\n\
         - CRITICAL: Respond in the SAME language as the input text\n\
         - DO NOT translate - keep the original language",
    );
    prompt
}

/// System prompt for short conversational answers.
pub fn short_answer_prompt() -> String {
    "You are a helpful AI assistant. Your task is to:\n\
     1. Provide a direct, helpful answer to the user's question or request\n\
     2. Keep responses concise but informative (2-4 sentences ideal)\n\
     3. Be conversational and friendly\n\
     4. If it's a question, answer it directly\n\
     5. If it's a statement, provide relevant insights or suggestions\n\
     6. CRITICAL: Respond in the SAME language as the input text\n\
     7. DO NOT translate - maintain the original language"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_forbidden_by_default() {
        let prompt = correction_prompt(LanguageTag::French, &CorrectionOptions::default());
        assert!(prompt.contains("Language: french"));
        assert!(prompt.contains("DO NOT translate"));
        assert!(prompt.contains("FRENCH"));
    }

    #[test]
    fn test_translation_allowed_when_opted_in() {
        let options = CorrectionOptions {
            allow_translation: true,
            ..Default::default()
        };
        let prompt = correction_prompt(LanguageTag::English, &options);
        assert!(prompt.contains("You MAY translate"));
        assert!(!prompt.contains("DO NOT translate."));
    }

    #[test]
    fn test_fix_scope_controls_tasks() {
        let spelling_only = CorrectionOptions {
            fix_scope: FixScope::Spelling,
            ..Default::default()
        };
        let prompt = correction_prompt(LanguageTag::English, &spelling_only);
        assert!(prompt.contains("Fix spelling errors"));
        assert!(!prompt.contains("Fix grammar mistakes"));
    }

    #[test]
    fn test_unlisted_language_gets_generic_warning() {
        let prompt = correction_prompt(LanguageTag::Turkish, &CorrectionOptions::default());
        assert!(prompt.contains("Maintain the original language (turkish)"));
    }

    #[test]
    fn test_continuation_prompt_tags() {
        let prompt = continuation_prompt(3);
        assert!(prompt.contains("OPTION_1:"));
        assert!(prompt.contains("OPTION_3:"));
        assert!(!prompt.contains("OPTION_4:"));
    }
}
