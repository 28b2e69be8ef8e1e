// src/evaluate.rs
//! Evaluation harness: F1 on the insult class and stratified k-fold
//! cross-validation over labeled samples. Consumes the detector; nothing in the
//! core depends on it.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::classifier::{InsultDetector, TextClassifier};
use crate::discussion::LabeledSample;
use crate::error::{InsultError, Result};

pub const DEFAULT_FOLDS: usize = 5;

/// F1 of the positive (insult) class; 0 when precision and recall are both undefined.
pub fn f1_score(truth: &[bool], predicted: &[bool]) -> f64 {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in truth.iter().zip(predicted) {
        match (t, p) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }
    let denom = 2 * tp + fp + fn_;
    if denom == 0 {
        0.0
    } else {
        (2 * tp) as f64 / denom as f64
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CrossValidation {
    pub fold_scores: Vec<f64>,
    pub mean: f64,
}

/// Test-set indices per fold. Insults are dealt round-robin over the folds in
/// input order, then the rest continue from the fold where the insults stopped.
/// Class proportions are kept, and with `k <= labels.len()` no fold is empty.
pub fn stratified_folds(labels: &[bool], k: usize) -> Vec<Vec<usize>> {
    let n = k.max(1);
    let mut folds = vec![Vec::new(); n];
    let mut next = 0usize;
    for class in [true, false] {
        for (i, _) in labels.iter().enumerate().filter(|(_, &l)| l == class) {
            folds[next % n].push(i);
            next += 1;
        }
    }
    for f in &mut folds {
        f.sort_unstable();
    }
    folds
}

/// Train a fresh detector per fold (folds run in parallel) and score each held-out split.
pub fn cross_validate<C, F>(make: F, samples: &[LabeledSample], k: usize) -> Result<CrossValidation>
where
    C: TextClassifier,
    F: Fn() -> Result<InsultDetector<C>> + Sync,
{
    if k < 2 || k > samples.len() {
        return Err(InsultError::Training(format!(
            "cannot make {k} folds from {} samples",
            samples.len()
        )));
    }

    let labels: Vec<bool> = samples.iter().map(|s| s.label).collect();
    let folds = stratified_folds(&labels, k);

    let fold_scores = folds
        .par_iter()
        .map(|test_idx| {
            let mut is_test = vec![false; samples.len()];
            for &i in test_idx {
                is_test[i] = true;
            }
            let train: Vec<LabeledSample> = samples
                .iter()
                .zip(&is_test)
                .filter(|(_, &t)| !t)
                .map(|(s, _)| s.clone())
                .collect();
            let test_texts: Vec<&str> = test_idx.iter().map(|&i| samples[i].text.as_str()).collect();
            let truth: Vec<bool> = test_idx.iter().map(|&i| labels[i]).collect();

            let detector = make()?;
            detector.train(&train)?;
            let predicted = detector.classify(&test_texts)?;
            Ok(f1_score(&truth, &predicted))
        })
        .collect::<Result<Vec<f64>>>()?;

    let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
    info!(target: "evaluate", folds = k, mean, "cross-validation finished");
    Ok(CrossValidation { fold_scores, mean })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f1_basic_cases() {
        assert_eq!(f1_score(&[true, false], &[true, false]), 1.0);
        assert_eq!(f1_score(&[false, false], &[false, false]), 0.0);
        // tp=1 fp=1 fn=1 → 2/4
        assert_eq!(f1_score(&[true, true, false], &[true, false, true]), 0.5);
    }

    #[test]
    fn folds_are_stratified_and_cover_everything() {
        let labels = [true, true, true, false, false, false, false, false, false];
        let folds = stratified_folds(&labels, 3);
        assert_eq!(folds.len(), 3);
        for f in &folds {
            assert_eq!(f.iter().filter(|&&i| labels[i]).count(), 1);
            assert_eq!(f.iter().filter(|&&i| !labels[i]).count(), 2);
        }
        let mut all: Vec<usize> = folds.concat();
        all.sort_unstable();
        assert_eq!(all, (0..labels.len()).collect::<Vec<_>>());
    }

    #[test]
    fn small_classes_leave_no_fold_empty() {
        let labels = [true, true, false, false];
        let folds = stratified_folds(&labels, 3);
        assert_eq!(folds, vec![vec![0, 3], vec![1], vec![2]]);
        assert!(folds.iter().all(|f| !f.is_empty()));
    }

    #[test]
    fn every_fold_is_scored_on_a_small_corpus() {
        let samples = vec![
            LabeledSample::new("you idiot", true),
            LabeledSample::new("you moron", true),
            LabeledSample::new("nice day", false),
            LabeledSample::new("thanks a lot", false),
        ];
        let cv = cross_validate(
            || InsultDetector::new(crate::config::DetectorConfig::default()),
            &samples,
            3,
        )
        .unwrap();
        assert_eq!(cv.fold_scores.len(), 3);
        assert!(cv.fold_scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn too_many_folds_is_an_error() {
        let samples = vec![LabeledSample::new("a", true)];
        let res = cross_validate(
            || InsultDetector::new(crate::config::DetectorConfig::default()),
            &samples,
            5,
        );
        assert!(matches!(res, Err(InsultError::Training(_))));
    }
}
