//! API request handlers

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::scorer::{Prediction, Scorer};
use crate::text::{Normalizer, WordSegmenter};

/// Shared application state
pub struct AppState {
    pub normalizer: Normalizer,
    pub scorer: Scorer,
}

impl AppState {
    pub fn new(normalizer: Normalizer, scorer: Scorer) -> Self {
        Self { normalizer, scorer }
    }

    /// Load the dictionary and both artifacts. Any failure aborts startup.
    pub fn load(config: &Config) -> Result<Self> {
        let segmenter = match &config.model.dictionary_path {
            Some(path) => WordSegmenter::from_file(path)?,
            None => {
                let segmenter = WordSegmenter::builtin()?;
                info!("Using built-in segmentation dictionary ({} words)", segmenter.len());
                segmenter
            }
        };

        let scorer = Scorer::load(&config.model)?;

        Ok(Self::new(Normalizer::new(segmenter), scorer))
    }
}

/// Successful prediction
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Comment exactly as received
    pub input_comment: Value,
    pub cleaned_comment: String,
    pub toxicity_score: f64,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(msg: &str) -> Self {
        Self {
            error: msg.to_string(),
        }
    }
}

/// Pull `comment` out of a request body. Unparsable bodies, non-objects
/// and bodies without a `comment` key count as absent.
fn extract_comment(body: &[u8]) -> Option<Value> {
    let mut payload: Value = serde_json::from_slice(body).ok()?;
    payload.get_mut("comment").map(Value::take)
}

/// Text form of a comment value. Non-strings use their JSON text, `null`
/// reads as `None`.
fn comment_text(comment: &Value) -> String {
    match comment {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Normalize and score off the async workers
async fn run_prediction(state: Arc<AppState>, text: String) -> Result<(String, Prediction)> {
    let (cleaned_comment, scored) = tokio::task::spawn_blocking(move || {
        let cleaned_comment = state.normalizer.normalize(&text);
        let scored = state.scorer.score(&cleaned_comment);
        (cleaned_comment, scored)
    })
    .await?;
    Ok((cleaned_comment, scored?))
}

/// POST /predict - Score a comment for toxicity
pub async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(comment) = extract_comment(&body) else {
        debug!("Rejected request without a comment ({} bytes)", body.len());
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("No comment provided")),
        )
            .into_response();
    };

    match run_prediction(state, comment_text(&comment)).await {
        Ok((cleaned_comment, prediction)) => {
            debug!(
                cleaned_len = cleaned_comment.len(),
                raw_score = prediction.raw_score,
                "Prediction served"
            );
            (
                StatusCode::OK,
                Json(PredictResponse {
                    input_comment: comment,
                    cleaned_comment,
                    toxicity_score: prediction.toxicity_score(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("{}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(&e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /ping - Liveness check
pub async fn ping() -> impl IntoResponse {
    Json(json!({ "message": "API is running" }))
}

/// GET /health - Loaded model summary
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let scorer = &state.scorer;
    Json(json!({
        "status": "healthy",
        "service": "toxicity-api",
        "version": env!("CARGO_PKG_VERSION"),
        "model": {
            "vectorizer_features": scorer.vectorizer_features(),
            "classifier_features": scorer.classifier_features(),
            "dimensions_match": scorer.dimensions_match(),
            "dictionary_words": state.normalizer.segmenter().len(),
        }
    }))
}
