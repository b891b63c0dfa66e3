//! Binary linear classifier loaded from a JSON export
//!
//! `coef` may be flat (`[w0, w1, ...]`) or a single nested row
//! (`[[w0, w1, ...]]`); `intercept` may be a number or a one-element array.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::{read_artifact, Classifier, FeatureVector, ModelError};
use crate::error::{Result, ToxicityError};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Coefficients {
    Flat(Vec<f64>),
    Rows(Vec<Vec<f64>>),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Intercept {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Default for Intercept {
    fn default() -> Self {
        Intercept::Scalar(0.0)
    }
}

/// On-disk form of the classifier
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinearArtifact {
    pub coef: Coefficients,
    #[serde(default)]
    pub intercept: Intercept,
}

impl LinearArtifact {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self {
            coef: Coefficients::Flat(coef),
            intercept: Intercept::Scalar(intercept),
        }
    }
}

/// `score = coef · x + intercept`
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    coef: Vec<f64>,
    intercept: f64,
}

impl LinearClassifier {
    pub fn from_file(path: &Path) -> Result<Self> {
        let artifact: LinearArtifact = read_artifact(path)?;
        let classifier = Self::try_from(artifact).map_err(|e| ToxicityError::Artifact {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(
            "Loaded linear classifier from {} ({} features)",
            path.display(),
            classifier.num_features()
        );
        Ok(classifier)
    }

    pub fn coef(&self) -> &[f64] {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn decide(&self, row: &FeatureVector) -> std::result::Result<f64, ModelError> {
        Ok(row.dot(&self.coef)? + self.intercept)
    }
}

impl TryFrom<LinearArtifact> for LinearClassifier {
    type Error = ModelError;

    fn try_from(artifact: LinearArtifact) -> std::result::Result<Self, Self::Error> {
        let coef = match artifact.coef {
            Coefficients::Flat(coef) => coef,
            Coefficients::Rows(mut rows) if rows.len() == 1 => rows.remove(0),
            Coefficients::Rows(rows) => {
                return Err(ModelError::InvalidArtifact(format!(
                    "expected a single coefficient row for a binary model, got {}",
                    rows.len()
                )))
            }
        };

        let intercept = match artifact.intercept {
            Intercept::Scalar(value) => value,
            Intercept::Array(values) if values.len() == 1 => values[0],
            Intercept::Array(values) => {
                return Err(ModelError::InvalidArtifact(format!(
                    "expected a single intercept, got {}",
                    values.len()
                )))
            }
        };

        if coef.is_empty() {
            return Err(ModelError::InvalidArtifact("coef is empty".to_string()));
        }
        if !intercept.is_finite() || coef.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::InvalidArtifact(
                "weights must be finite".to_string(),
            ));
        }

        Ok(Self { coef, intercept })
    }
}

impl Classifier for LinearClassifier {
    fn decision_function(&self, rows: &[FeatureVector]) -> std::result::Result<Vec<f64>, ModelError> {
        rows.iter().map(|row| self.decide(row)).collect()
    }

    fn num_features(&self) -> usize {
        self.coef.len()
    }
}
