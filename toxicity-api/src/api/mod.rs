//! REST API module for toxicity-api
//!
//! `POST /predict`, `GET /ping` and `GET /health`

pub mod handlers;
pub mod server;

pub use handlers::{ApiError, AppState};
pub use server::ApiServer;
