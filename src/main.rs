//! Insult Detector Service: Binary Entrypoint
//! Loads config and lexicon, optionally trains from a corpus file, then serves
//! the Axum HTTP API.

use std::path::PathBuf;

use anyhow::Context;
use insult_detector::config::{DEFAULT_BIND, ENV_BIND, ENV_TRAIN_PATH};
use insult_detector::{DetectorConfig, InsultDetector};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ENV_LOG_FORMAT: &str = "INSULT_LOG_FORMAT";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("insult_detector=info,warn"));

    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = DetectorConfig::from_env()?;
    let detector = InsultDetector::new(config).context("failed to build detector")?;

    match std::env::var(ENV_TRAIN_PATH) {
        Ok(path) => {
            insult_detector::train_from_path(&detector, &PathBuf::from(path))?;
        }
        Err(_) => warn!("{ENV_TRAIN_PATH} not set; POST /train before classifying"),
    }

    let app = insult_detector::app(detector)?;

    let bind = std::env::var(ENV_BIND).unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
