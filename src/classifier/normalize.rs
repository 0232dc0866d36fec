//! Title normalization shared by training and inference
//!
//! Both sides must produce identical token strings for the same title, so the
//! excluded target term travels with the model bundle.

use std::collections::HashSet;
use std::sync::OnceLock;

/// NLTK English stop words, apostrophe forms included
fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        stop_words::get(stop_words::LANGUAGE::English)
            .iter()
            .copied()
            .collect()
    })
}

/// Check whether `word` (already lowercase) is an English stop word
pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Turns raw titles into the space-separated token strings the vectorizer sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    target_term: String,
}

impl Normalizer {
    pub fn new(target_term: &str) -> Self {
        Self {
            target_term: target_term.to_lowercase(),
        }
    }

    pub fn target_term(&self) -> &str {
        &self.target_term
    }

    /// Normalize a raw title
    ///
    /// Punctuation is deleted (so `don't` becomes `dont`), any other
    /// non-letter becomes a space, and the result is lowercased. Tokens of a
    /// single letter, stop words and the target term are dropped.
    pub fn normalize(&self, raw: &str) -> String {
        let letters_only: String = raw
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .map(|c| {
                if c.is_ascii_alphabetic() {
                    c.to_ascii_lowercase()
                } else {
                    ' '
                }
            })
            .collect();

        letters_only
            .split_whitespace()
            .filter(|word| word.len() > 1)
            .filter(|word| !is_stop_word(word) && *word != self.target_term)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
