// src/vectorize.rs
//! Bag-of-n-grams TF-IDF over the canonical token stream.
//!
//! Fitting runs through aprender's `TfidfVectorizer`. The canonical tokenizer is
//! plugged into it as an aprender `Tokenizer` that emits the n-gram terms
//! (`ngram_min..=ngram_max`, joined by one space) and drops terms outside the
//! document-frequency window (`df >= min_df`, `df / n_docs <= max_df`).
//! The fitted vocabulary and idf weights are then kept as plain data so the
//! published model stays `Send + Sync`; rows are count × idf, L2-normalized.

use aprender::text::vectorize::TfidfVectorizer as TfidfFitter;
use aprender::AprenderError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{InsultError, Result};
use crate::tokenizer::{Token, Tokenizer};

/// Sparse feature row; `indices` strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparseRow {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseRow {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NgramParams {
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub min_df: usize,
    pub max_df: f64,
}

impl Default for NgramParams {
    fn default() -> Self {
        Self {
            ngram_min: 1,
            ngram_max: 2,
            min_df: 1,
            max_df: 0.75,
        }
    }
}

impl NgramParams {
    pub fn validate(&self) -> Result<()> {
        if self.ngram_min == 0 || self.ngram_min > self.ngram_max {
            return Err(InsultError::Config(format!(
                "invalid ngram range ({}, {})",
                self.ngram_min, self.ngram_max
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(InsultError::Config(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        Ok(())
    }
}

/// Canonical tokens → n-gram terms, restricted to the kept vocabulary.
struct TermTokenizer {
    tokenizer: Tokenizer,
    params: NgramParams,
    kept: HashSet<String>,
}

impl aprender::text::Tokenizer for TermTokenizer {
    fn tokenize(&self, text: &str) -> std::result::Result<Vec<String>, AprenderError> {
        let tokens = self.tokenizer.tokenize(text);
        Ok(ngrams(&tokens, &self.params)
            .filter(|t| self.kept.contains(t))
            .collect())
    }
}

/// Fitted vectorizer. Read-only after `fit`.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    params: NgramParams,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit(params: NgramParams, tokenizer: &Tokenizer, texts: &[&str]) -> Result<Self> {
        params.validate()?;

        let mut df: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let uniq: HashSet<String> = ngrams(&tokenizer.tokenize(text), &params).collect();
            for term in uniq {
                *df.entry(term).or_insert(0) += 1;
            }
        }
        let n = texts.len().max(1) as f64;
        let kept: HashSet<String> = df
            .into_iter()
            .filter(|(_, d)| *d >= params.min_df && (*d as f64) / n <= params.max_df)
            .map(|(term, _)| term)
            .collect();

        // Nothing survives pruning: the pattern columns still carry the model.
        if kept.is_empty() {
            return Ok(Self {
                params,
                vocabulary: HashMap::new(),
                idf: Vec::new(),
            });
        }

        let mut fitter = TfidfFitter::new().with_tokenizer(Box::new(TermTokenizer {
            tokenizer: tokenizer.clone(),
            params,
            kept,
        }));
        fitter
            .fit_transform(texts)
            .map_err(|e| InsultError::Training(format!("tf-idf fit: {e:?}")))?;

        let idf: Vec<f64> = fitter.idf_values().to_vec();
        let vocabulary: HashMap<String, usize> = fitter
            .vocabulary()
            .iter()
            .filter(|(_, &i)| i < idf.len())
            .map(|(term, &i)| (term.clone(), i))
            .collect();

        Ok(Self {
            params,
            vocabulary,
            idf,
        })
    }

    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Unknown n-grams are ignored; an all-unknown document yields an empty row.
    pub fn transform(&self, tokens: &[Token]) -> SparseRow {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in ngrams(tokens, &self.params) {
            if let Some(&i) = self.vocabulary.get(&term) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }

        let mut row = SparseRow {
            indices: Vec::with_capacity(counts.len()),
            values: Vec::with_capacity(counts.len()),
        };
        for (i, c) in counts {
            row.indices.push(i);
            row.values.push(c * self.idf[i]);
        }

        let norm = row.squared_norm().sqrt();
        if norm > 0.0 {
            for v in &mut row.values {
                *v /= norm;
            }
        }
        row
    }
}

fn ngrams<'a>(tokens: &'a [Token], p: &NgramParams) -> impl Iterator<Item = String> + 'a {
    let (lo, hi) = (p.ngram_min, p.ngram_max);
    (lo..=hi).flat_map(move |n| {
        tokens.windows(n).map(|w| {
            w.iter()
                .map(Token::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
    })
}
