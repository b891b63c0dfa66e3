//! TF-IDF vectorizer loaded from a JSON export
//!
//! Expected layout (extra fields are ignored):
//!
//! ```json
//! {
//!   "vocabulary": {"hate": 0, "idiot": 1},
//!   "idf": [1.9, 2.4],
//!   "ngram_range": [1, 1],
//!   "sublinear_tf": false,
//!   "norm": "l2"
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use super::{read_artifact, FeatureVector, ModelError, Vectorizer};
use crate::error::{Result, ToxicityError};

/// Row normalization applied after IDF weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// On-disk form of the vectorizer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TfidfArtifact {
    /// Term (or space-joined n-gram) to column index
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per column
    pub idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    /// `null` disables normalization
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    /// Tokens removed before n-grams are built
    #[serde(default)]
    pub stop_words: Vec<String>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

fn default_token_pattern() -> String {
    r"(?u)\b\w\w+\b".to_string()
}

fn default_lowercase() -> bool {
    true
}

impl TfidfArtifact {
    /// Artifact with default options for the given vocabulary and weights
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f64>) -> Self {
        Self {
            vocabulary,
            idf,
            ngram_range: default_ngram_range(),
            sublinear_tf: false,
            norm: default_norm(),
            token_pattern: default_token_pattern(),
            lowercase: default_lowercase(),
            stop_words: Vec::new(),
        }
    }
}

/// Word n-gram TF-IDF vectorizer
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Option<Norm>,
    token_pattern: Regex,
    lowercase: bool,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    /// Load and validate a JSON export
    pub fn from_file(path: &Path) -> Result<Self> {
        let artifact: TfidfArtifact = read_artifact(path)?;
        let vectorizer = Self::try_from(artifact).map_err(|e| ToxicityError::Artifact {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(
            "Loaded TF-IDF vectorizer from {} ({} features, ngram_range {:?})",
            path.display(),
            vectorizer.num_features(),
            vectorizer.ngram_range
        );
        Ok(vectorizer)
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocabulary
    }

    fn tokens<'a>(&self, document: &'a str) -> Vec<&'a str> {
        self.token_pattern
            .find_iter(document)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect()
    }

    /// Unigrams as-is, longer n-grams joined by a single space
    fn ngrams(&self, tokens: &[&str]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let mut grams = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                grams.push(window.join(" "));
            }
        }
        grams
    }

    fn transform_one(&self, document: &str) -> std::result::Result<FeatureVector, ModelError> {
        let lowered;
        let document = if self.lowercase {
            lowered = document.to_lowercase();
            lowered.as_str()
        } else {
            document
        };

        let tokens = self.tokens(document);
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in self.ngrams(&tokens) {
            if let Some(&col) = self.vocabulary.get(&gram) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (col, tf * self.idf[col])
            })
            .collect();

        let norm = match self.norm {
            Some(Norm::L2) => entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            None => 1.0,
        };
        if norm > 0.0 && norm != 1.0 {
            for (_, v) in entries.iter_mut() {
                *v /= norm;
            }
        }

        FeatureVector::from_entries(self.idf.len(), entries)
    }
}

impl TryFrom<TfidfArtifact> for TfidfVectorizer {
    type Error = ModelError;

    fn try_from(artifact: TfidfArtifact) -> std::result::Result<Self, Self::Error> {
        if artifact.vocabulary.is_empty() {
            return Err(ModelError::InvalidArtifact("vocabulary is empty".to_string()));
        }
        if let Some(bad) = artifact.idf.iter().find(|w| !w.is_finite()) {
            return Err(ModelError::InvalidArtifact(format!(
                "idf contains a non-finite weight ({bad})"
            )));
        }

        let dim = artifact.idf.len();
        let mut columns = HashSet::with_capacity(artifact.vocabulary.len());
        for (term, &col) in &artifact.vocabulary {
            if col >= dim {
                return Err(ModelError::InvalidArtifact(format!(
                    "term {term:?} maps to column {col} but idf has {dim} entries"
                )));
            }
            if !columns.insert(col) {
                return Err(ModelError::InvalidArtifact(format!(
                    "column {col} is assigned to more than one term"
                )));
            }
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelError::InvalidArtifact(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }

        let token_pattern = Regex::new(&artifact.token_pattern).map_err(|e| {
            ModelError::InvalidArtifact(format!("token_pattern does not compile: {e}"))
        })?;

        debug!(
            terms = artifact.vocabulary.len(),
            features = dim,
            "TF-IDF artifact validated"
        );

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            token_pattern,
            lowercase: artifact.lowercase,
            stop_words: artifact.stop_words.into_iter().collect(),
        })
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, documents: &[&str]) -> std::result::Result<Vec<FeatureVector>, ModelError> {
        documents.iter().map(|doc| self.transform_one(doc)).collect()
    }

    fn num_features(&self) -> usize {
        self.idf.len()
    }
}
