//! Pre-trained model artifacts
//!
//! The vectorizer and classifier are opaque to the rest of the service and
//! are only reached through the [`Vectorizer`] and [`Classifier`] traits.
//! The shipped implementations read JSON exports of a TF-IDF vectorizer and a
//! linear SVM / logistic model.

use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

use crate::error::{Result, ToxicityError};

pub mod linear;
pub mod tfidf;

pub use linear::{LinearArtifact, LinearClassifier};
pub use tfidf::{Norm, TfidfArtifact, TfidfVectorizer};

/// Errors raised by artifact operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Vector dimension does not match what the classifier was trained on
    #[error("X has {found} features, but the classifier is expecting {expected} features as input")]
    ShapeMismatch { expected: usize, found: usize },

    /// Sparse entry outside the vector dimension
    #[error("feature index {index} is out of range for {dim} features")]
    IndexOutOfRange { index: usize, dim: usize },

    /// An operation returned no rows for a non-empty batch
    #[error("model returned no result for the input batch")]
    EmptyBatch,

    /// Decision function produced NaN or infinity
    #[error("decision function returned a non-finite score ({0})")]
    NonFinite(f64),

    /// Artifact contents are inconsistent
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),
}

/// Sparse feature vector with a fixed dimension.
///
/// Entries are sorted by index and indices are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// All-zero vector
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs in any order.
    ///
    /// Repeated indices are summed and explicit zeros are dropped.
    pub fn from_entries(
        dim: usize,
        mut entries: Vec<(usize, f64)>,
    ) -> std::result::Result<Self, ModelError> {
        if let Some(&(index, _)) = entries.iter().find(|(i, _)| *i >= dim) {
            return Err(ModelError::IndexOutOfRange { index, dim });
        }

        entries.sort_by_key(|(i, _)| *i);
        let mut merged: Vec<(usize, f64)> = Vec::with_capacity(entries.len());
        for (index, value) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == index => *acc += value,
                _ => merged.push((index, value)),
            }
        }
        merged.retain(|(_, v)| *v != 0.0);

        Ok(Self {
            dim,
            entries: merged,
        })
    }

    pub fn from_dense(values: &[f64]) -> Self {
        Self {
            dim: values.len(),
            entries: values
                .iter()
                .enumerate()
                .filter(|(_, v)| **v != 0.0)
                .map(|(i, v)| (i, *v))
                .collect(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Non-zero entries, sorted by index
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for &(i, v) in &self.entries {
            dense[i] = v;
        }
        dense
    }

    /// Dot product with a dense weight vector of the same dimension
    pub fn dot(&self, weights: &[f64]) -> std::result::Result<f64, ModelError> {
        if weights.len() != self.dim {
            return Err(ModelError::ShapeMismatch {
                expected: weights.len(),
                found: self.dim,
            });
        }
        Ok(self.entries.iter().map(|&(i, v)| weights[i] * v).sum())
    }
}

/// Turns documents into feature vectors
pub trait Vectorizer: Send + Sync {
    /// Vectorize a batch; one vector per document, in order
    fn transform(&self, documents: &[&str]) -> std::result::Result<Vec<FeatureVector>, ModelError>;

    /// Dimension of every produced vector
    fn num_features(&self) -> usize;
}

/// Linear decision function over feature vectors
pub trait Classifier: Send + Sync {
    /// Raw margin for each row, in order
    fn decision_function(&self, rows: &[FeatureVector]) -> std::result::Result<Vec<f64>, ModelError>;

    /// Dimension the classifier was trained on
    fn num_features(&self) -> usize;
}

/// Read and deserialize a JSON artifact, attributing any failure to `path`
pub(crate) fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| ToxicityError::Artifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| ToxicityError::Artifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_sorts_and_merges() {
        let v = FeatureVector::from_entries(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (4, 0.0)]).unwrap();
        assert_eq!(v.entries(), &[(1, 2.0), (3, 1.5)]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.get(3), 1.5);
        assert_eq!(v.get(0), 0.0);
        assert_eq!(v.to_dense(), vec![0.0, 2.0, 0.0, 1.5, 0.0]);
    }

    #[test]
    fn test_from_entries_rejects_out_of_range() {
        let err = FeatureVector::from_entries(2, vec![(2, 1.0)]).unwrap_err();
        assert_eq!(err, ModelError::IndexOutOfRange { index: 2, dim: 2 });
    }

    #[test]
    fn test_dot_checks_dimension() {
        let v = FeatureVector::from_dense(&[1.0, 0.0, 2.0]);
        assert_eq!(v.dot(&[0.5, 10.0, 1.0]).unwrap(), 2.5);

        let err = v.dot(&[1.0, 1.0]).unwrap_err();
        assert_eq!(err, ModelError::ShapeMismatch { expected: 2, found: 3 });
        assert!(err.to_string().contains("X has 3 features"));
    }

    #[test]
    fn test_read_artifact_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = read_artifact::<serde_json::Value>(&path).unwrap_err();
        assert!(matches!(err, ToxicityError::Artifact { .. }));
        assert!(err.to_string().contains("broken.json"));

        let missing = dir.path().join("missing.json");
        let err = read_artifact::<serde_json::Value>(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
