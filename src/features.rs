// src/features.rs
//! Feature assembler: bag-of-n-grams dimensions first, then the three
//! pattern-window features, each block scaled by its own weight.
//!
//! Column layout (fixed for a fitted assembler, identical at train and predict):
//! `[0, V)` TF-IDF vocabulary, `V` directed score, `V+1` message length
//! (× `length_scale`), `V+2` insults ratio.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::debug::{anon_hash, dev_logging_enabled};
use crate::error::Result;
use crate::tokenizer::{Token, Tokenizer};
use crate::vectorize::{NgramParams, SparseRow, TfidfVectorizer};
use crate::window::{FeatureVector, PatternDetector, WindowReport};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub min_df: usize,
    pub max_df: f64,
    pub bow_weight: f64,
    pub pattern_weight: f64,
    /// Multiplier for the raw length column; keeps it on the scale of the others.
    pub length_scale: f64,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            ngram_min: 1,
            ngram_max: 2,
            min_df: 1,
            max_df: 0.75,
            bow_weight: 1.0,
            pattern_weight: 1.0,
            length_scale: 0.01,
        }
    }
}

impl FeaturesConfig {
    pub fn ngram_params(&self) -> NgramParams {
        NgramParams {
            ngram_min: self.ngram_min,
            ngram_max: self.ngram_max,
            min_df: self.min_df,
            max_df: self.max_df,
        }
    }
}

/// Tokens plus the window scan of one message.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub tokens: Vec<Token>,
    pub window: WindowReport,
}

/// Tokenizer + pattern detector; needs no fitting.
#[derive(Debug, Clone)]
pub struct LexicalFeatures {
    tokenizer: Tokenizer,
    detector: PatternDetector,
}

impl LexicalFeatures {
    pub fn new(tokenizer: Tokenizer, detector: PatternDetector) -> Self {
        Self {
            tokenizer,
            detector,
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn analyze(&self, text: &str) -> Analysis {
        let tokens = self.tokenizer.tokenize(text);
        let window = self.detector.scan(&tokens, text.chars().count());
        Analysis { tokens, window }
    }
}

/// Fitted assembler. Shared read-only by every classification after training.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    cfg: FeaturesConfig,
    lexical: LexicalFeatures,
    bow: TfidfVectorizer,
}

impl FeatureAssembler {
    /// Fit the bag-of-n-grams vocabulary on `texts` (any iterator; consumed once).
    pub fn fit<'a, I>(cfg: FeaturesConfig, lexical: LexicalFeatures, texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let docs: Vec<&str> = texts.into_iter().collect();
        let bow = TfidfVectorizer::fit(cfg.ngram_params(), &lexical.tokenizer, &docs)?;
        debug!(
            target: "features",
            docs = docs.len(),
            vocabulary = bow.dimension(),
            "fitted bag-of-ngrams"
        );
        Ok(Self { cfg, lexical, bow })
    }

    /// Total width: vocabulary + pattern features.
    pub fn dimension(&self) -> usize {
        self.bow.dimension() + FeatureVector::WIDTH
    }

    pub fn vocabulary_size(&self) -> usize {
        self.bow.dimension()
    }

    pub fn lexical(&self) -> &LexicalFeatures {
        &self.lexical
    }

    pub fn assemble(&self, text: &str) -> SparseRow {
        let analysis = self.lexical.analyze(text);
        let mut row = self.bow.transform(&analysis.tokens);
        for v in &mut row.values {
            *v *= self.cfg.bow_weight;
        }

        let fv = analysis.window.features;
        let offset = self.bow.dimension();
        let pattern = [
            fv.directed_score,
            fv.message_length as f64 * self.cfg.length_scale,
            fv.insults_ratio,
        ];
        for (k, v) in pattern.into_iter().enumerate() {
            let v = v * self.cfg.pattern_weight;
            if v != 0.0 {
                row.indices.push(offset + k);
                row.values.push(v);
            }
        }

        if dev_logging_enabled() {
            debug!(
                target: "features",
                id = %anon_hash(text),
                tokens = analysis.tokens.len(),
                directed = fv.directed_score,
                ratio = fv.insults_ratio,
                nnz = row.nnz(),
                "assembled"
            );
        }
        row
    }

    /// Order-preserving batch form of [`assemble`](Self::assemble).
    pub fn assemble_batch<'a, I>(&self, texts: I) -> Vec<SparseRow>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().map(|t| self.assemble(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{Lexicon, LexiconConfig};
    use crate::window::WindowConfig;

    fn lexical() -> LexicalFeatures {
        let cfg = LexiconConfig::default_seed();
        let det = PatternDetector::new(Lexicon::from_config(&cfg).unwrap(), WindowConfig::default());
        LexicalFeatures::new(cfg.tokenizer(), det)
    }

    #[test]
    fn pattern_columns_follow_vocabulary() {
        let asm = FeatureAssembler::fit(
            FeaturesConfig::default(),
            lexical(),
            ["you idiot", "have a nice day"],
        )
        .unwrap();
        let v = asm.vocabulary_size();
        assert_eq!(asm.dimension(), v + 3);

        let row = asm.assemble("you idiot");
        let tail: Vec<(usize, f64)> = row.iter().filter(|(i, _)| *i >= v).collect();
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0], (v, 0.5));
        assert!((tail[1].1 - 0.09).abs() < 1e-12);
        assert_eq!(tail[2], (v + 2, 0.5));
    }

    #[test]
    fn weights_scale_each_block() {
        let cfg = FeaturesConfig {
            bow_weight: 0.0,
            pattern_weight: 2.0,
            ..Default::default()
        };
        let asm = FeatureAssembler::fit(cfg, lexical(), ["you idiot", "nice"]).unwrap();
        let row = asm.assemble("you idiot");
        let v = asm.vocabulary_size();
        assert!(row.iter().filter(|(i, _)| *i < v).all(|(_, x)| x == 0.0));
        assert!(row.iter().any(|(i, x)| i == v && (x - 1.0).abs() < 1e-12));
    }

    #[test]
    fn assembly_is_consistent_between_calls() {
        let asm = FeatureAssembler::fit(FeaturesConfig::default(), lexical(), ["a b", "c d"]).unwrap();
        let batch = asm.assemble_batch(["a b", "you idiot"]);
        assert_eq!(batch[0], asm.assemble("a b"));
        assert_eq!(batch[1], asm.assemble("you idiot"));
    }
}
