// src/classifier.rs
//! Classifier adapter: trains a model over assembled features and classifies
//! raw texts with it.
//!
//! The statistical model is pluggable through [`TextClassifier`]. The fitted
//! model (assembler + weights) is published as an immutable `Arc` behind a
//! `RwLock`; retraining builds a complete replacement off-lock and swaps it in
//! with a new generation stamp. Classification clones the `Arc` and runs
//! without holding the lock.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::config::DetectorConfig;
use crate::discussion::{labeled_samples, Discussion, LabeledSample, MessageClassifier};
use crate::error::{InsultError, Result};
use crate::features::{Analysis, FeatureAssembler, LexicalFeatures};
use crate::lexicon::Lexicon;
use crate::logistic::LogisticClassifier;
use crate::vectorize::SparseRow;
use crate::window::PatternDetector;

/// A fitted model: read-only, shareable across threads.
pub trait ClassifierModel: Send + Sync {
    /// One label per row, in row order; `true` means insult.
    fn predict(&self, rows: &[SparseRow]) -> Result<Vec<bool>>;
}

/// Trainable binary classifier over numeric feature rows.
pub trait TextClassifier: Send + Sync {
    type Model: ClassifierModel + 'static;

    /// `dimension` is the total column count of every row.
    fn fit(&self, rows: &[SparseRow], labels: &[bool], dimension: usize) -> Result<Self::Model>;
}

/// Everything needed to classify, stamped with its generation.
#[derive(Debug)]
pub struct TrainedModel<M> {
    pub generation: u64,
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
    pub assembler: FeatureAssembler,
    pub model: M,
}

/// Summary of the currently published model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelInfo {
    pub generation: u64,
    pub trained_at: DateTime<Utc>,
    pub samples: usize,
    pub vocabulary: usize,
    pub dimension: usize,
}

impl<M> TrainedModel<M> {
    fn info(&self) -> ModelInfo {
        ModelInfo {
            generation: self.generation,
            trained_at: self.trained_at,
            samples: self.samples,
            vocabulary: self.assembler.vocabulary_size(),
            dimension: self.assembler.dimension(),
        }
    }
}

pub struct InsultDetector<C: TextClassifier = LogisticClassifier> {
    config: DetectorConfig,
    lexical: LexicalFeatures,
    classifier: C,
    slot: RwLock<Option<Arc<TrainedModel<C::Model>>>>,
}

impl InsultDetector<LogisticClassifier> {
    /// Default logistic-regression detector. Fails fast on an invalid lexicon or config.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let logistic = LogisticClassifier::new(config.classifier);
        Self::with_classifier(config, logistic)
    }
}

impl<C: TextClassifier> InsultDetector<C> {
    pub fn with_classifier(config: DetectorConfig, classifier: C) -> Result<Self> {
        config.validate()?;
        let lexicon = Lexicon::from_config(&config.lexicon)?;
        let detector = PatternDetector::new(lexicon, config.window);
        let lexical = LexicalFeatures::new(config.lexicon.tokenizer(), detector);
        Ok(Self {
            config,
            lexical,
            classifier,
            slot: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Train on `samples`; replaces any previous model on success only.
    pub fn train(&self, samples: &[LabeledSample]) -> Result<ModelInfo> {
        if samples.is_empty() {
            return Err(InsultError::Training("no usable samples".into()));
        }
        let positives = samples.iter().filter(|s| s.label).count();
        if positives == 0 || positives == samples.len() {
            return Err(InsultError::Training(format!(
                "all {} samples carry the same label",
                samples.len()
            )));
        }

        let assembler = FeatureAssembler::fit(
            self.config.features,
            self.lexical.clone(),
            samples.iter().map(|s| s.text.as_str()),
        )?;
        let rows: Vec<SparseRow> = samples
            .par_iter()
            .map(|s| assembler.assemble(&s.text))
            .collect();
        let labels: Vec<bool> = samples.iter().map(|s| s.label).collect();
        let model = self.classifier.fit(&rows, &labels, assembler.dimension())?;

        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let generation = guard.as_ref().map_or(0, |m| m.generation) + 1;
        let trained = Arc::new(TrainedModel {
            generation,
            trained_at: Utc::now(),
            samples: samples.len(),
            assembler,
            model,
        });
        let info = trained.info();
        *guard = Some(trained);
        drop(guard);

        counter!("insult_model_trainings_total").increment(1);
        gauge!("insult_model_generation").set(generation as f64);
        info!(
            target: "classifier",
            generation,
            samples = info.samples,
            positives,
            vocabulary = info.vocabulary,
            "model trained"
        );
        Ok(info)
    }

    /// Flatten labeled discussions and train on every usable message.
    pub fn train_discussions(&self, discussions: &[Discussion]) -> Result<ModelInfo> {
        let samples = labeled_samples(discussions);
        if samples.is_empty() {
            warn!(target: "classifier", roots = discussions.len(), "corpus has no labeled text");
        }
        self.train(&samples)
    }

    /// Current model, or `ModelNotReady` before the first successful training.
    pub fn current(&self) -> Result<Arc<TrainedModel<C::Model>>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(InsultError::ModelNotReady)
    }

    pub fn model_info(&self) -> Result<ModelInfo> {
        self.current().map(|m| m.info())
    }

    /// Labels plus the generation that produced them. Empty text is never an
    /// insult and is not sent to the model; the rest go in one batch.
    pub fn classify_with_generation<S: AsRef<str> + Sync>(
        &self,
        texts: &[S],
    ) -> Result<(Vec<bool>, u64)> {
        let model = self.current()?;
        let pending: Vec<usize> = (0..texts.len())
            .filter(|&i| !texts[i].as_ref().is_empty())
            .collect();
        let rows: Vec<SparseRow> = pending
            .par_iter()
            .map(|&i| model.assembler.assemble(texts[i].as_ref()))
            .collect();
        let predicted = model.model.predict(&rows)?;
        if predicted.len() != rows.len() {
            return Err(InsultError::Classifier(format!(
                "{} predictions for {} rows",
                predicted.len(),
                rows.len()
            )));
        }

        let mut labels = vec![false; texts.len()];
        for (&i, p) in pending.iter().zip(predicted) {
            labels[i] = p;
        }

        let flagged = labels.iter().filter(|&&l| l).count();
        counter!("insult_messages_classified_total").increment(labels.len() as u64);
        counter!("insult_messages_flagged_total").increment(flagged as u64);
        Ok((labels, model.generation))
    }

    pub fn classify<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<Vec<bool>> {
        self.classify_with_generation(texts).map(|(labels, _)| labels)
    }

    /// Tokens and window features for one text; needs no model.
    pub fn explain(&self, text: &str) -> Analysis {
        self.lexical.analyze(text)
    }
}

impl<C: TextClassifier> MessageClassifier for InsultDetector<C> {
    fn classify(&self, texts: &[&str]) -> Result<Vec<bool>> {
        self.classify_with_generation(texts).map(|(labels, _)| labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(text: &str, label: bool) -> LabeledSample {
        LabeledSample {
            text: text.into(),
            label,
        }
    }

    fn detector() -> InsultDetector {
        InsultDetector::new(DetectorConfig::default()).unwrap()
    }

    #[test]
    fn classify_before_training_is_not_ready() {
        let d = detector();
        assert!(matches!(d.classify(&["hi"]), Err(InsultError::ModelNotReady)));
        assert!(matches!(d.model_info(), Err(InsultError::ModelNotReady)));
    }

    #[test]
    fn degenerate_training_sets_fail() {
        let d = detector();
        assert!(matches!(d.train(&[]), Err(InsultError::Training(_))));
        let same = [sample("a", true), sample("b", true)];
        assert!(matches!(d.train(&same), Err(InsultError::Training(_))));
        // failed training leaves the slot empty
        assert!(matches!(d.current(), Err(InsultError::ModelNotReady)));
    }

    #[test]
    fn retraining_bumps_generation() {
        let d = detector();
        let data = [sample("you idiot", true), sample("have a nice day", false)];
        assert_eq!(d.train(&data).unwrap().generation, 1);
        assert_eq!(d.train(&data).unwrap().generation, 2);
        assert_eq!(d.model_info().unwrap().generation, 2);
    }

    #[test]
    fn empty_input_and_empty_text() {
        let d = detector();
        d.train(&[sample("you idiot", true), sample("have a nice day", false)])
            .unwrap();
        let none: [&str; 0] = [];
        assert!(d.classify(&none).unwrap().is_empty());
        assert_eq!(d.classify(&[""]).unwrap(), vec![false]);
    }

    struct AlwaysInsult;
    struct AlwaysModel;

    impl ClassifierModel for AlwaysModel {
        fn predict(&self, rows: &[SparseRow]) -> Result<Vec<bool>> {
            Ok(vec![true; rows.len()])
        }
    }

    impl TextClassifier for AlwaysInsult {
        type Model = AlwaysModel;

        fn fit(&self, _: &[SparseRow], _: &[bool], _: usize) -> Result<AlwaysModel> {
            Ok(AlwaysModel)
        }
    }

    #[test]
    fn pluggable_backend_never_sees_empty_text() {
        let d = InsultDetector::with_classifier(DetectorConfig::default(), AlwaysInsult).unwrap();
        d.train(&[sample("a", true), sample("b", false)]).unwrap();
        assert_eq!(
            d.classify(&["x", "", "y"]).unwrap(),
            vec![true, false, true]
        );
    }

    #[test]
    fn explain_needs_no_model() {
        let a = detector().explain("you idiot!!");
        assert_eq!(a.tokens.len(), 3);
        assert_eq!(a.window.directed_hits, 1);
    }
}
