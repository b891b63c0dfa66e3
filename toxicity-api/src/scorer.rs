//! Toxicity scoring: vectorize, decide, squash

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::model::{Classifier, LinearClassifier, ModelError, TfidfVectorizer, Vectorizer};

/// Logistic function, stable for large `|x|` and kept strictly inside (0, 1)
pub fn sigmoid(x: f64) -> f64 {
    let p = if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    };
    p.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON)
}

/// Round to 4 decimal places, half away from zero
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Result of scoring one normalized comment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Classifier margin before the sigmoid
    pub raw_score: f64,
    /// Unrounded probability
    pub probability: f64,
}

impl Prediction {
    /// Rounded probability reported to clients
    pub fn toxicity_score(&self) -> f64 {
        round4(self.probability)
    }
}

/// Vectorizer + classifier pair
#[derive(Clone)]
pub struct Scorer {
    vectorizer: Arc<dyn Vectorizer>,
    classifier: Arc<dyn Classifier>,
}

impl Scorer {
    pub fn new(vectorizer: Arc<dyn Vectorizer>, classifier: Arc<dyn Classifier>) -> Self {
        let scorer = Self {
            vectorizer,
            classifier,
        };
        if !scorer.dimensions_match() {
            warn!(
                "Vectorizer produces {} features but classifier expects {}; predictions will fail",
                scorer.vectorizer_features(),
                scorer.classifier_features()
            );
        }
        scorer
    }

    /// Load the JSON artifacts named by `config`
    pub fn load(config: &ModelConfig) -> Result<Self> {
        info!("Loading vectorizer from {}", config.vectorizer_path.display());
        let vectorizer = TfidfVectorizer::from_file(&config.vectorizer_path)?;

        info!("Loading classifier from {}", config.classifier_path.display());
        let classifier = LinearClassifier::from_file(&config.classifier_path)?;

        Ok(Self::new(Arc::new(vectorizer), Arc::new(classifier)))
    }

    /// Dimension of vectors produced by the vectorizer
    pub fn vectorizer_features(&self) -> usize {
        self.vectorizer.num_features()
    }

    /// Dimension the classifier expects
    pub fn classifier_features(&self) -> usize {
        self.classifier.num_features()
    }

    pub fn dimensions_match(&self) -> bool {
        self.vectorizer_features() == self.classifier_features()
    }

    /// Score an already normalized comment
    pub fn score(&self, normalized: &str) -> std::result::Result<Prediction, ModelError> {
        let rows = self.vectorizer.transform(&[normalized])?;
        if rows.is_empty() {
            return Err(ModelError::EmptyBatch);
        }

        let raw_score = self
            .classifier
            .decision_function(&rows)?
            .first()
            .copied()
            .ok_or(ModelError::EmptyBatch)?;
        if !raw_score.is_finite() {
            return Err(ModelError::NonFinite(raw_score));
        }

        let probability = sigmoid(raw_score);
        debug!(
            chars = normalized.len(),
            raw_score, probability, "Scored comment"
        );

        Ok(Prediction {
            raw_score,
            probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureVector, LinearArtifact, TfidfArtifact};
    use std::collections::HashMap;

    fn scorer() -> Scorer {
        let vocabulary: HashMap<String, usize> = [("hate", 0), ("idiot", 1), ("thanks", 2)]
            .into_iter()
            .map(|(t, i)| (t.to_string(), i))
            .collect();
        let vectorizer = TfidfVectorizer::try_from(TfidfArtifact::new(vocabulary, vec![1.0; 3])).unwrap();
        let classifier =
            LinearClassifier::try_from(LinearArtifact::new(vec![3.0, 4.0, -2.0], -0.5)).unwrap();
        Scorer::new(Arc::new(vectorizer), Arc::new(classifier))
    }

    struct NoRows;

    impl Vectorizer for NoRows {
        fn transform(&self, _: &[&str]) -> std::result::Result<Vec<FeatureVector>, ModelError> {
            Ok(Vec::new())
        }

        fn num_features(&self) -> usize {
            1
        }
    }

    struct Exploding;

    impl Classifier for Exploding {
        fn decision_function(&self, rows: &[FeatureVector]) -> std::result::Result<Vec<f64>, ModelError> {
            Ok(vec![f64::NAN; rows.len()])
        }

        fn num_features(&self) -> usize {
            3
        }
    }

    #[test]
    fn test_sigmoid_properties() {
        assert_eq!(sigmoid(0.0), 0.5);
        for x in [-1000.0, -40.0, -1.0, 1.0, 40.0, 1000.0] {
            let p = sigmoid(x);
            assert!(p > 0.0 && p < 1.0, "sigmoid({x}) = {p}");
        }

        let xs: Vec<f64> = (-200..=200).map(|i| i as f64 * 0.25).collect();
        for pair in xs.windows(2) {
            assert!(sigmoid(pair[0]) <= sigmoid(pair[1]));
        }
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(0.5), 0.5);
        assert_eq!(round4(0.999_99), 1.0);
    }

    #[test]
    fn test_score_toxic_vs_clean() {
        let scorer = scorer();
        let toxic = scorer.score("hate idiot").unwrap();
        let clean = scorer.score("thanks").unwrap();
        assert!(toxic.probability > 0.5);
        assert!(clean.probability < 0.5);
        assert!((0.0..=1.0).contains(&toxic.toxicity_score()));
    }

    #[test]
    fn test_score_empty_comment_uses_intercept() {
        let prediction = scorer().score("").unwrap();
        assert_eq!(prediction.raw_score, -0.5);
        assert_eq!(prediction.probability, sigmoid(-0.5));
        assert_eq!(prediction.toxicity_score(), 0.3775);
    }

    #[test]
    fn test_score_is_deterministic() {
        let scorer = scorer();
        assert_eq!(scorer.score("hate thanks"), scorer.score("hate thanks"));
    }

    #[test]
    fn test_dimension_mismatch_is_a_prediction_failure() {
        let vocabulary: HashMap<String, usize> = [("hate".to_string(), 0)].into_iter().collect();
        let vectorizer = TfidfVectorizer::try_from(TfidfArtifact::new(vocabulary, vec![1.0])).unwrap();
        let classifier = LinearClassifier::try_from(LinearArtifact::new(vec![1.0, 1.0], 0.0)).unwrap();
        let scorer = Scorer::new(Arc::new(vectorizer), Arc::new(classifier));

        assert!(!scorer.dimensions_match());
        let err = scorer.score("hate").unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 2, found: 1 }));
    }

    #[test]
    fn test_empty_batch_and_non_finite() {
        let classifier = LinearClassifier::try_from(LinearArtifact::new(vec![1.0], 0.0)).unwrap();
        let scorer = Scorer::new(Arc::new(NoRows), Arc::new(classifier));
        assert_eq!(scorer.score("anything").unwrap_err(), ModelError::EmptyBatch);

        let base = self::scorer();
        let scorer = Scorer::new(base.vectorizer.clone(), Arc::new(Exploding));
        assert!(matches!(scorer.score("hate").unwrap_err(), ModelError::NonFinite(_)));
    }
}
