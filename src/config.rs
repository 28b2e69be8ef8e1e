// src/config.rs
//! Detector configuration loaded from TOML (`config/detector.toml` by default).
//!
//! ```toml
//! [features]
//! ngram_min = 1
//! ngram_max = 2
//! max_df = 0.75
//! bow_weight = 1.0
//! pattern_weight = 1.0
//!
//! [classifier]
//! learning_rate = 0.1
//! max_iter = 1000
//!
//! [window]
//! insult_span = 3
//!
//! [lexicon]
//! insult = ["idiots?", "morons?"]
//! address = ["you", "your"]
//! weak_insult = ["silly"]
//! stop_words = []
//! ```
//!
//! Every key is optional; missing keys take their defaults. A missing
//! `[lexicon]` section uses the built-in seed lists.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{InsultError, Result};
use crate::features::FeaturesConfig;
use crate::lexicon::LexiconConfig;
use crate::logistic::LogisticParams;
use crate::window::WindowConfig;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/detector.toml";
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

pub const ENV_CONFIG_PATH: &str = "INSULT_CONFIG_PATH";
pub const ENV_LEARNING_RATE: &str = "INSULT_LEARNING_RATE";
pub const ENV_TRAIN_PATH: &str = "INSULT_TRAIN_PATH";
pub const ENV_BIND: &str = "INSULT_BIND";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub features: FeaturesConfig,
    pub classifier: LogisticParams,
    pub window: WindowConfig,
    pub lexicon: LexiconConfig,
}

impl DetectorConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(toml_str).map_err(|e| InsultError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read detector config at {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid detector config at {}", path.display()))
    }

    /// Resolve INSULT_CONFIG_PATH (or the default path), then apply env overrides.
    /// A missing file at the default path yields the defaults; an explicitly
    /// configured path must exist.
    pub fn from_env() -> anyhow::Result<Self> {
        let explicit = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = if path.exists() || explicit.is_some() {
            info!(target: "config", path = %path.display(), "loading detector config");
            Self::from_path(&path)?
        } else {
            warn!(target: "config", path = %path.display(), "no detector config found; using defaults");
            Self::default()
        };

        if let Some(rate) = parse_learning_rate_env(std::env::var(ENV_LEARNING_RATE).ok()) {
            cfg.classifier.learning_rate = rate;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.features.ngram_params().validate()?;
        self.classifier.validate()?;
        for (name, w) in [
            ("bow_weight", self.features.bow_weight),
            ("pattern_weight", self.features.pattern_weight),
            ("length_scale", self.features.length_scale),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(InsultError::Config(format!("{name} must be a finite value >= 0, got {w}")));
            }
        }
        Ok(())
    }
}

// parse optional learning-rate env; ignore garbage, zero and negatives
fn parse_learning_rate_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}
