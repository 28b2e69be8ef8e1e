// src/window.rs
//! Pattern-window detector: a single left-to-right pass over the token stream
//! that counts insults and *directed* insults (an insult near an address word,
//! in either order, possibly separated by filler tokens).
//!
//! The scan state is three countdown ranges, one per word category. A range > 0
//! means "a token of that category was seen within the last N tokens". Per token:
//! 1. classify the token,
//! 2. evaluate the undirected and directed rules against the *current* ranges,
//! 3. decrement every range by one,
//! 4. re-arm the range of the token's own category to its span.
//!
//! The state lives for one message and is threaded through a fold; nothing is
//! shared between messages.

use serde::{Deserialize, Serialize};

use crate::lexicon::{Lexicon, WordCategory};
use crate::tokenizer::Token;

/// Directed-hit count at which the directed score saturates.
pub const DIRECTED_SATURATION: u32 = 2;

/// Span each category's range is re-armed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub insult_span: u32,
    pub address_span: u32,
    pub weak_insult_span: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            insult_span: 3,
            address_span: 3,
            weak_insult_span: 2,
        }
    }
}

/// Countdown ranges for one message scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowState {
    pub insult_range: u32,
    pub address_range: u32,
    pub weak_insult_range: u32,
}

/// What a single token contributed during the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Hit {
    undirected: bool,
    directed: bool,
}

impl WindowState {
    fn step(self, cat: WordCategory, spans: &WindowConfig) -> (Self, Hit) {
        use WordCategory::*;

        let insult_on = self.insult_range > 0;
        let address_on = self.address_range > 0;
        let weak_on = self.weak_insult_range > 0;

        // A weak insult only counts on its own when reinforced by recent context.
        let undirected = match cat {
            Insult => true,
            WeakInsult => address_on || insult_on,
            _ => false,
        };

        let directed = (insult_on && matches!(cat, Insult | Address | WeakInsult))
            || (address_on && matches!(cat, Insult | WeakInsult))
            || (weak_on && matches!(cat, Insult | Address));

        let mut next = Self {
            insult_range: self.insult_range.saturating_sub(1),
            address_range: self.address_range.saturating_sub(1),
            weak_insult_range: self.weak_insult_range.saturating_sub(1),
        };
        match cat {
            Insult => next.insult_range = spans.insult_span,
            Address => next.address_range = spans.address_span,
            WeakInsult => next.weak_insult_range = spans.weak_insult_span,
            Neutral => {}
        }

        (next, Hit { undirected, directed })
    }
}

/// Fixed-width per-message features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    /// 0, 0.5 or 1.0: directed hits over [`DIRECTED_SATURATION`], clamped.
    pub directed_score: f64,
    /// Raw text length in characters.
    pub message_length: usize,
    /// Undirected insult hits per token, 0 for an empty token stream.
    pub insults_ratio: f64,
}

impl FeatureVector {
    pub const WIDTH: usize = 3;

    pub fn to_array(&self) -> [f64; Self::WIDTH] {
        [
            self.directed_score,
            self.message_length as f64,
            self.insults_ratio,
        ]
    }
}

/// Full scan outcome; `features` is what the classifier sees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowReport {
    pub features: FeatureVector,
    pub token_count: usize,
    pub undirected_hits: u32,
    pub directed_hits: u32,
    pub was_insult: bool,
}

#[derive(Debug, Clone)]
pub struct PatternDetector {
    lexicon: Lexicon,
    spans: WindowConfig,
}

impl PatternDetector {
    pub fn new(lexicon: Lexicon, spans: WindowConfig) -> Self {
        Self { lexicon, spans }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Never fails: an empty token stream maps to `(0, text_len, 0)`.
    pub fn detect(&self, tokens: &[Token], text_len: usize) -> FeatureVector {
        self.scan(tokens, text_len).features
    }

    pub fn scan(&self, tokens: &[Token], text_len: usize) -> WindowReport {
        let (_, undirected, directed) = tokens.iter().fold(
            (WindowState::default(), 0u32, 0u32),
            |(state, undirected, directed), tok| {
                let cat = self.lexicon.classify(tok.as_str());
                let (next, hit) = state.step(cat, &self.spans);
                (
                    next,
                    undirected + hit.undirected as u32,
                    directed + hit.directed as u32,
                )
            },
        );

        let insults_ratio = if tokens.is_empty() {
            0.0
        } else {
            undirected as f64 / tokens.len() as f64
        };

        WindowReport {
            features: FeatureVector {
                directed_score: directed_score(directed),
                message_length: text_len,
                insults_ratio,
            },
            token_count: tokens.len(),
            undirected_hits: undirected,
            directed_hits: directed,
            was_insult: undirected > 0,
        }
    }
}

/// `> 2 → 1.0`, otherwise `n / 2`.
pub fn directed_score(hits: u32) -> f64 {
    if hits > DIRECTED_SATURATION {
        1.0
    } else {
        hits as f64 / DIRECTED_SATURATION as f64
    }
}
