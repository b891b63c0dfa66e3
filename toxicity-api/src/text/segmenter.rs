//! Word segmentation for text written without spaces
//!
//! Splits a run of letters into the most probable sequence of dictionary
//! words. Words are ranked by frequency and priced with a Zipf cost model:
//! the word at rank `i` costs `ln((i + 1) * ln(N))`. A dynamic program picks
//! the split with the lowest total cost.

use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, ToxicityError};

/// Frequency-ranked English word list embedded at compile time (gzip)
static BUILTIN_WORDS: &[u8] = include_bytes!("../../data/words.txt.gz");

/// Dictionary-backed word segmenter
#[derive(Debug, Clone)]
pub struct WordSegmenter {
    word_costs: HashMap<String, f64>,
    max_word_len: usize,
    /// Price of a single character that is not itself a dictionary word
    unknown_char_cost: f64,
}

impl WordSegmenter {
    /// Build a segmenter from the embedded dictionary
    pub fn builtin() -> Result<Self> {
        let content = decompress(BUILTIN_WORDS, &"the builtin dictionary")?;
        Self::from_ranked_words(content.lines())
    }

    /// Build a segmenter from words ordered by descending frequency.
    ///
    /// Blank lines are skipped, words are trimmed and lowercased, and a word
    /// listed twice keeps its first (cheaper) rank.
    pub fn from_ranked_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = clean_words(words);
        if words.is_empty() {
            return Err(ToxicityError::Dictionary(
                "word list is empty".to_string(),
            ));
        }
        Ok(Self::ranked(words))
    }

    /// Load a dictionary file, one word per line.
    ///
    /// Files ending in `.gz` are decompressed first.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|e| {
            ToxicityError::Dictionary(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let content = if path.extension().is_some_and(|ext| ext == "gz") {
            decompress(&raw, &path.display())?
        } else {
            String::from_utf8(raw).map_err(|e| {
                ToxicityError::Dictionary(format!("{} is not UTF-8: {}", path.display(), e))
            })?
        };

        let words = clean_words(content.lines());
        if words.is_empty() {
            return Err(ToxicityError::Dictionary(format!(
                "{}: word list is empty",
                path.display()
            )));
        }

        let segmenter = Self::ranked(words);
        info!(
            "Loaded segmentation dictionary from {} ({} words)",
            path.display(),
            segmenter.len()
        );
        Ok(segmenter)
    }

    /// `words` must be non-empty
    fn ranked(words: Vec<String>) -> Self {
        let log_n = (words.len().max(2) as f64).ln();
        let mut word_costs = HashMap::with_capacity(words.len());
        let mut max_word_len = 1;

        for (rank, word) in words.into_iter().enumerate() {
            max_word_len = max_word_len.max(word.chars().count());
            word_costs
                .entry(word)
                .or_insert_with(|| ((rank + 1) as f64 * log_n).ln());
        }

        let rarest = ((word_costs.len() + 1) as f64 * log_n).ln();

        debug!(
            words = word_costs.len(),
            max_word_len, "Word segmenter dictionary built"
        );

        Self {
            word_costs,
            max_word_len,
            unknown_char_cost: 2.0 * rarest,
        }
    }

    /// Number of distinct dictionary words
    pub fn len(&self) -> usize {
        self.word_costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_costs.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_costs.contains_key(word)
    }

    /// Split `text` into words.
    ///
    /// Whitespace-separated chunks are segmented independently. Lookups are
    /// exact, so callers lowercase first.
    pub fn split(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .flat_map(|chunk| self.split_chunk(chunk))
            .collect()
    }

    fn split_chunk(&self, chunk: &str) -> Vec<String> {
        // Byte offset of every char boundary, including the end
        let bounds: Vec<usize> = chunk
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(chunk.len()))
            .collect();
        let n = bounds.len() - 1;

        // best[i] = (cost of the cheapest split of the first i chars,
        //            char length of its last word)
        let mut best: Vec<(f64, usize)> = vec![(0.0, 0); n + 1];
        for i in 1..=n {
            let mut candidate = (f64::INFINITY, 1);
            for len in 1..=self.max_word_len.min(i) {
                let piece = &chunk[bounds[i - len]..bounds[i]];
                let total = best[i - len].0 + self.word_cost(piece, len);
                if total < candidate.0 {
                    candidate = (total, len);
                }
            }
            best[i] = candidate;
        }

        let mut words = Vec::new();
        let mut end = n;
        while end > 0 {
            let len = best[end].1;
            words.push(chunk[bounds[end - len]..bounds[end]].to_string());
            end -= len;
        }
        words.reverse();
        words
    }

    fn word_cost(&self, piece: &str, char_len: usize) -> f64 {
        match self.word_costs.get(piece) {
            Some(cost) => *cost,
            None if char_len == 1 => self.unknown_char_cost,
            None => f64::INFINITY,
        }
    }
}

fn clean_words<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn decompress(raw: &[u8], source: &dyn std::fmt::Display) -> Result<String> {
    let mut decoded = String::new();
    GzDecoder::new(raw)
        .read_to_string(&mut decoded)
        .map_err(|e| ToxicityError::Dictionary(format!("Failed to decompress {}: {}", source, e)))?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn builtin() -> WordSegmenter {
        WordSegmenter::builtin().unwrap()
    }

    #[test]
    fn test_builtin_dictionary_loads() {
        let seg = builtin();
        assert!(seg.len() > 40_000);
        for letter in 'a'..='z' {
            assert!(seg.contains(&letter.to_string()), "missing letter {letter}");
        }
    }

    #[test]
    fn test_split_concatenated_phrases() {
        let seg = builtin();
        assert_eq!(seg.split("ihateyou"), vec!["i", "hate", "you"]);
        assert_eq!(seg.split("youareanidiot"), vec!["you", "are", "an", "idiot"]);
        assert_eq!(seg.split("thisisatest"), vec!["this", "is", "a", "test"]);
        assert_eq!(seg.split("helloworld"), vec!["hello", "world"]);
    }

    #[test]
    fn test_split_words_beyond_common_vocabulary() {
        let seg = builtin();
        assert_eq!(seg.split("hypocriteandbigot"), vec!["hypocrite", "and", "bigot"]);
        assert_eq!(seg.split("wikipediaeditors"), vec!["wikipedia", "editors"]);
        assert_eq!(seg.split("biasedpropaganda"), vec!["biased", "propaganda"]);
        assert_eq!(seg.split("googleit"), vec!["google", "it"]);
    }

    #[test]
    fn test_split_empty_input() {
        let seg = builtin();
        assert!(seg.split("").is_empty());
        assert!(seg.split("   ").is_empty());
    }

    #[test]
    fn test_unknown_characters_fall_back_to_single_chars() {
        let seg = WordSegmenter::from_ranked_words(["hello", "world"]).unwrap();
        assert_eq!(seg.split("qqhello"), vec!["q", "q", "hello"]);
        assert_eq!(seg.split("xyz"), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_whitespace_chunks_segment_independently() {
        let seg = builtin();
        assert_eq!(seg.split("goodmorning helloworld"), vec!["good", "morning", "hello", "world"]);
    }

    #[test]
    fn test_frequency_rank_breaks_ambiguity() {
        // "together" beats "to get her" only when it is common enough
        let common = WordSegmenter::from_ranked_words(["together", "to", "get", "her"]).unwrap();
        assert_eq!(common.split("together"), vec!["together"]);

        let mut filler: Vec<String> = vec!["to".into(), "get".into(), "her".into()];
        filler.extend((0..10_000).map(|i| format!("filler{i}")));
        filler.push("together".into());
        let rare = WordSegmenter::from_ranked_words(&filler).unwrap();
        assert_eq!(rare.split("together"), vec!["to", "get", "her"]);
    }

    #[test]
    fn test_duplicate_words_keep_first_rank() {
        let seg = WordSegmenter::from_ranked_words(["a", "b", "a"]).unwrap();
        assert_eq!(seg.len(), 2);
    }

    #[test]
    fn test_empty_word_list_rejected() {
        let err = WordSegmenter::from_ranked_words(["", "  "]).unwrap_err();
        assert!(matches!(err, ToxicityError::Dictionary(_)));
    }

    #[test]
    fn test_from_file_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("words.txt");
        std::fs::write(&plain, "hello\nworld\n").unwrap();
        let seg = WordSegmenter::from_file(&plain).unwrap();
        assert_eq!(seg.split("helloworld"), vec!["hello", "world"]);

        let gz = dir.path().join("words.txt.gz");
        let file = std::fs::File::create(&gz).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"good\nmorning\n").unwrap();
        encoder.finish().unwrap();
        let seg = WordSegmenter::from_file(&gz).unwrap();
        assert_eq!(seg.split("goodmorning"), vec!["good", "morning"]);
    }

    #[test]
    fn test_from_file_empty_names_path_once() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "\n  \n").unwrap();

        let message = WordSegmenter::from_file(&empty).unwrap_err().to_string();
        assert!(message.contains("empty.txt"), "{message}");
        assert!(message.ends_with("word list is empty"), "{message}");
        assert_eq!(message.matches("Dictionary error").count(), 1, "{message}");
    }

    #[test]
    fn test_from_file_missing() {
        let err = WordSegmenter::from_file(Path::new("/nonexistent/words.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/words.txt"));
    }
}
