//! Comment normalization ahead of vectorization
//!
//! Pipeline:
//! 1. Unicode-aware lowercase
//! 2. Drop URLs (`http` up to the next whitespace)
//! 3. Keep only ASCII letters and whitespace
//! 4. Drop ASCII punctuation
//! 5. Remove whitespace and re-segment into dictionary words
//! 6. Drop stopwords
//! 7. Join with single spaces

use regex::Regex;
use std::sync::LazyLock;

use super::segmenter::WordSegmenter;
use super::stopwords::is_stopword;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+").expect("valid URL pattern"));

/// Turns raw comments into the space-joined token form the vectorizer expects.
///
/// Holds only read-only data, so one instance is shared by every request.
#[derive(Debug, Clone)]
pub struct Normalizer {
    segmenter: WordSegmenter,
}

impl Normalizer {
    pub fn new(segmenter: WordSegmenter) -> Self {
        Self { segmenter }
    }

    pub fn segmenter(&self) -> &WordSegmenter {
        &self.segmenter
    }

    /// Normalize a comment. Deterministic; may return an empty string.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_urls = URL_PATTERN.replace_all(&lowered, "");

        let letters: String = without_urls
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
            .filter(|c| !c.is_ascii_punctuation())
            .collect();

        let joined: String = letters.chars().filter(|c| !c.is_whitespace()).collect();

        self.segmenter
            .split(&joined)
            .into_iter()
            .filter(|word| !word.is_empty() && !is_stopword(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
