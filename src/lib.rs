// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod config;
pub mod debug;
pub mod error;
pub mod metrics;

// Lexical feature engine
pub mod features;
pub mod lexicon;
pub mod tokenizer;
pub mod vectorize;
pub mod window;

// Model + discussion trees
pub mod classifier;
pub mod discussion;
pub mod evaluate;
pub mod logistic;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::classifier::{ClassifierModel, InsultDetector, ModelInfo, TextClassifier};
pub use crate::config::DetectorConfig;
pub use crate::discussion::{
    label_forest, label_tree, labeled_samples, parse_corpus, Discussion, LabeledSample, Message,
    MessageClassifier,
};
pub use crate::error::{InsultError, Result};
pub use crate::lexicon::{Lexicon, LexiconConfig, WordCategory};
pub use crate::logistic::{ClassWeight, LogisticClassifier, LogisticParams};
pub use crate::tokenizer::{Token, Tokenizer};
pub use crate::window::{FeatureVector, PatternDetector, WindowConfig};

use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::info;

/// Build the full HTTP app: API routes plus `/metrics`.
pub fn app(detector: InsultDetector) -> anyhow::Result<axum::Router> {
    let metrics = crate::metrics::Metrics::init()?;
    Ok(api::router(api::AppState::new(detector)).merge(metrics.router()))
}

/// Read a corpus file and train `detector` on it.
pub fn train_from_path(detector: &InsultDetector, path: &Path) -> anyhow::Result<ModelInfo> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read corpus at {}", path.display()))?;
    let corpus =
        parse_corpus(&raw).with_context(|| format!("invalid corpus at {}", path.display()))?;
    let model = detector
        .train_discussions(&corpus)
        .with_context(|| format!("training on {} failed", path.display()))?;
    info!(
        generation = model.generation,
        samples = model.samples,
        roots = corpus.len(),
        "trained from corpus file"
    );
    Ok(model)
}
