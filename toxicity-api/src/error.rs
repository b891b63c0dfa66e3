//! Error types for toxicity-api

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ModelError;

/// Result type alias for toxicity-api operations
pub type Result<T> = std::result::Result<T, ToxicityError>;

/// Service error types
#[derive(Error, Debug)]
pub enum ToxicityError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A model artifact could not be read, parsed or validated
    #[error("Failed to load artifact {}: {reason}", path.display())]
    Artifact { path: PathBuf, reason: String },

    /// Segmentation dictionary could not be loaded
    #[error("Dictionary error: {0}")]
    Dictionary(String),

    /// Vectorization or scoring failed for a request
    #[error("Prediction failed: {0}")]
    Prediction(#[from] ModelError),

    /// The blocking scoring task panicked or was cancelled
    #[error("Prediction failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<::config::ConfigError> for ToxicityError {
    fn from(err: ::config::ConfigError) -> Self {
        ToxicityError::Config(err.to_string())
    }
}
