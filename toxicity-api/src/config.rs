//! Configuration for toxicity-api
//!
//! Sources, lowest to highest priority: built-in defaults, a TOML file,
//! `TOXICITY__<SECTION>__<KEY>` environment variables, then `PORT`.

use ::config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ToxicityError};

/// File read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Main service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Permissive CORS on every route
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Artifact locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_classifier_path")]
    pub classifier_path: PathBuf,
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: PathBuf,
    /// Segmentation word list; the embedded list is used when unset
    #[serde(default)]
    pub dictionary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_enabled() -> bool {
    true
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_classifier_path() -> PathBuf {
    PathBuf::from("svm_model.json")
}

fn default_vectorizer_path() -> PathBuf {
    PathBuf::from("tfidf_vectorizer.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_cors_enabled(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_path: default_classifier_path(),
            vectorizer_path: default_vectorizer_path(),
            dictionary_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load from all sources, reading `PORT` from the process environment.
    ///
    /// An explicit `path` must exist; otherwise `config.toml` is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_port(path, std::env::var("PORT").ok())
    }

    /// Same as [`Config::load`] with the `PORT` value supplied by the caller
    pub fn load_with_port(path: Option<&Path>, port: Option<String>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("TOXICITY")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(port) = port {
            let port: u16 = port.trim().parse().map_err(|_| {
                ToxicityError::Config(format!("PORT must be a port number, got {:?}", port))
            })?;
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parse a TOML document directly, without other sources
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ToxicityError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Address for the HTTP listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(ToxicityError::Config("server.host is empty".to_string()));
        }
        if self.server.port == 0 {
            return Err(ToxicityError::Config("server.port must be non-zero".to_string()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ToxicityError::Config(
                "server.max_body_bytes must be non-zero".to_string(),
            ));
        }
        if self.model.classifier_path.as_os_str().is_empty() {
            return Err(ToxicityError::Config("model.classifier_path is empty".to_string()));
        }
        if self.model.vectorizer_path.as_os_str().is_empty() {
            return Err(ToxicityError::Config("model.vectorizer_path is empty".to_string()));
        }
        if matches!(&self.model.dictionary_path, Some(p) if p.as_os_str().is_empty()) {
            return Err(ToxicityError::Config("model.dictionary_path is empty".to_string()));
        }
        Ok(())
    }
}
