//! toxicity-api: comment toxicity inference server

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use toxicity_api::config::{LogFormat, LoggingConfig};
use toxicity_api::{ApiServer, AppState, Config};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "toxicity-api", version, about = "Comment toxicity inference server")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "TOXICITY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overrides config and PORT
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "toxicity_api={level},tower_http={level}",
            level = logging.level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    }
    .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.logging)?;

    info!("Starting toxicity-api v{}", env!("CARGO_PKG_VERSION"));
    config.validate()?;

    info!("Configuration loaded");
    info!("  Vectorizer: {}", config.model.vectorizer_path.display());
    info!("  Classifier: {}", config.model.classifier_path.display());
    if let Some(path) = &config.model.dictionary_path {
        info!("  Dictionary: {}", path.display());
    }

    let state = match AppState::load(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to load model artifacts: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "Model ready ({} features)",
        state.scorer.vectorizer_features()
    );

    let server = ApiServer::new(state, &config.server);
    server.run().await?;

    Ok(())
}
