//! Error type shared by every stage of the detector.

use thiserror::Error;

/// Top-level error for tokenizing, training and classification.
#[derive(Debug, Error)]
pub enum InsultError {
    /// Text at an untyped boundary (JSON) was null or not a string.
    #[error("invalid input: {0}")]
    Input(String),

    /// Training could not produce a usable model.
    #[error("training failed: {0}")]
    Training(String),

    /// Classification was requested before any successful training.
    #[error("model not ready: train the detector before classifying")]
    ModelNotReady,

    /// A classifier broke its contract (e.g. returned the wrong number of labels).
    #[error("classifier contract violated: {0}")]
    Classifier(String),

    /// A lexicon entry did not compile into a whole-token matcher.
    #[error("lexicon `{list}` entry `{entry}` is not a valid pattern: {source}")]
    Lexicon {
        list: &'static str,
        entry: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error("corpus is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result alias used across the crate.
pub type Result<T> = std::result::Result<T, InsultError>;
