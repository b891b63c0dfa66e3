//! API Server - HTTP server for the prediction API

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{self, AppState};
use crate::config::ServerConfig;

/// API Server configuration
pub struct ApiServer {
    state: Arc<AppState>,
    addr: String,
    cors_enabled: bool,
    max_body_bytes: usize,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        Self {
            state: Arc::new(state),
            addr: format!("{}:{}", config.host, config.port),
            cors_enabled: config.cors_enabled,
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/predict", post(handlers::predict))
            .route("/ping", get(handlers::ping))
            .route("/health", get(handlers::health))
            .layer(DefaultBodyLimit::max(self.max_body_bytes))
            .layer(TraceLayer::new_for_http());

        if self.cors_enabled {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router.with_state(self.state.clone())
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!("Toxicity API listening on http://{}", addr);
        }
        axum::serve(listener, self.router()).await
    }

    /// Start the API server
    pub async fn run(&self) -> std::io::Result<()> {
        info!("Starting API server on {}", self.addr);

        let listener = TcpListener::bind(&self.addr).await?;
        self.serve(listener).await
    }
}
