//! toxicity-api: HTTP inference service for comment toxicity
//!
//! Comments are normalized (lowercased, URLs and non-letters stripped,
//! re-segmented into dictionary words, stopwords dropped), vectorized with a
//! pre-trained TF-IDF model and scored by a linear classifier. The sigmoid of
//! the margin is returned as the toxicity score.
//!
//! # Endpoints
//!
//! - `POST /predict` with `{"comment": "..."}`
//! - `GET /ping`
//! - `GET /health`
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 5000
//! cors_enabled = true
//!
//! [model]
//! vectorizer_path = "artifacts/tfidf_vectorizer.json"
//! classifier_path = "artifacts/svm_model.json"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod scorer;
pub mod text;

pub use crate::api::{ApiServer, AppState};
pub use crate::config::Config;
pub use crate::error::{Result, ToxicityError};
pub use crate::scorer::{Prediction, Scorer};
pub use crate::text::Normalizer;
