// src/logistic.rs
//! Logistic regression backend (aprender) behind [`TextClassifier`].
//!
//! Sparse feature rows are densified into an `f32` matrix for aprender.
//! Balanced class weighting is done by oversampling the minority class
//! before fitting.

use aprender::classification::LogisticRegression;
use aprender::primitives::Matrix;
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierModel, TextClassifier};
use crate::error::{InsultError, Result};
use crate::vectorize::SparseRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassWeight {
    Balanced,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub max_iter: usize,
    pub class_weight: ClassWeight,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 1000,
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl LogisticParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(InsultError::Config(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }
        if self.max_iter == 0 {
            return Err(InsultError::Config("max_iter must be >= 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogisticClassifier {
    params: LogisticParams,
}

impl LogisticClassifier {
    pub fn new(params: LogisticParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LogisticParams {
        &self.params
    }
}

/// Fitted aprender model plus the column count it was trained on.
#[derive(Debug)]
pub struct LogisticModel {
    model: LogisticRegression,
    dimension: usize,
}

impl ClassifierModel for LogisticModel {
    fn predict(&self, rows: &[SparseRow]) -> Result<Vec<bool>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = densify(rows, self.dimension)?;
        let predicted = self.model.predict(&x);
        Ok((0..rows.len()).map(|i| predicted[i] == 1).collect())
    }
}

impl TextClassifier for LogisticClassifier {
    type Model = LogisticModel;

    fn fit(&self, rows: &[SparseRow], labels: &[bool], dimension: usize) -> Result<LogisticModel> {
        self.params.validate()?;
        if rows.len() != labels.len() {
            return Err(InsultError::Training(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let positives = labels.iter().filter(|&&l| l).count();
        if rows.is_empty() || positives == 0 || positives == rows.len() {
            return Err(InsultError::Training(
                "need at least one sample of each class".into(),
            ));
        }

        let order = match self.params.class_weight {
            ClassWeight::Balanced => balanced_order(labels),
            ClassWeight::None => (0..rows.len()).collect(),
        };
        let picked: Vec<SparseRow> = order.iter().map(|&i| rows[i].clone()).collect();
        let x = densify(&picked, dimension)?;
        let y: Vec<usize> = order.iter().map(|&i| usize::from(labels[i])).collect();

        let mut model = LogisticRegression::new()
            .with_learning_rate(self.params.learning_rate as _)
            .with_max_iter(self.params.max_iter as _);
        model
            .fit(&x, &y)
            .map_err(|e| InsultError::Training(format!("logistic regression: {e:?}")))?;

        Ok(LogisticModel { model, dimension })
    }
}

/// Row indices with the minority class repeated until both classes have the
/// same count. Original order first, repeats appended.
pub(crate) fn balanced_order(labels: &[bool]) -> Vec<usize> {
    let pos: Vec<usize> = (0..labels.len()).filter(|&i| labels[i]).collect();
    let neg: Vec<usize> = (0..labels.len()).filter(|&i| !labels[i]).collect();
    let (minority, deficit) = if pos.len() < neg.len() {
        (&pos, neg.len() - pos.len())
    } else {
        (&neg, pos.len() - neg.len())
    };

    let mut order: Vec<usize> = (0..labels.len()).collect();
    if !minority.is_empty() {
        order.extend(minority.iter().cycle().take(deficit).copied());
    }
    order
}

fn densify(rows: &[SparseRow], dimension: usize) -> Result<Matrix<f32>> {
    let mut data = vec![0.0f32; rows.len() * dimension];
    for (r, row) in rows.iter().enumerate() {
        for (c, v) in row.iter() {
            if c < dimension {
                data[r * dimension + c] = v as f32;
            }
        }
    }
    Matrix::from_vec(rows.len(), dimension, data)
        .map_err(|e| InsultError::Classifier(format!("feature matrix: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(usize, f64)]) -> SparseRow {
        SparseRow {
            indices: pairs.iter().map(|p| p.0).collect(),
            values: pairs.iter().map(|p| p.1).collect(),
        }
    }

    #[test]
    fn separates_disjoint_rows() {
        let rows = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)]), row(&[(0, 0.8), (2, 0.6)])];
        let labels = vec![true, false, true];
        let m = LogisticClassifier::default().fit(&rows, &labels, 3).unwrap();
        assert_eq!(m.predict(&rows).unwrap(), labels);
        assert!(m.predict(&[]).unwrap().is_empty());
    }

    #[test]
    fn single_class_is_rejected() {
        let rows = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)])];
        let err = LogisticClassifier::default().fit(&rows, &[true, true], 2).unwrap_err();
        assert!(matches!(err, InsultError::Training(_)));
    }

    #[test]
    fn empty_is_rejected() {
        let err = LogisticClassifier::default().fit(&[], &[], 3).unwrap_err();
        assert!(matches!(err, InsultError::Training(_)));
    }

    #[test]
    fn invalid_params_are_config_errors() {
        let c = LogisticClassifier::new(LogisticParams {
            max_iter: 0,
            ..Default::default()
        });
        let rows = vec![row(&[(0, 1.0)]), row(&[(1, 1.0)])];
        assert!(matches!(c.fit(&rows, &[true, false], 2), Err(InsultError::Config(_))));
    }

    #[test]
    fn balancing_repeats_the_minority() {
        let order = balanced_order(&[true, false, false, false, true, false]);
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5, 0, 4]);
        assert_eq!(balanced_order(&[true, false]), vec![0, 1]);
    }

    #[test]
    fn densify_places_values_by_column() {
        let m = densify(&[row(&[(1, 2.0)]), row(&[(0, 1.0), (2, 3.0)])], 3).unwrap();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 3);
        assert_eq!(m.as_slice(), &[0.0, 2.0, 0.0, 1.0, 0.0, 3.0]);
    }
}
