// src/tokenizer.rs
//! Canonical tokenizer for informal discussion text.
//!
//! Lower-cases the input and extracts, left to right, maximal matches of:
//! - word characters (`\w+`), dropped when the first char is a digit
//! - emoticon faces `:)` `;)` `:-)` `;-)` `%)` `=)` → `:)`
//! - runs of `(` → `(`, runs of `)` → `)`
//! - runs of `!` → `!`, runs of `?` → `?`
//! - runs of `+` with optional trailing digits → `+`
//!
//! Anything else (whitespace, other punctuation) separates tokens and is not emitted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use crate::error::{InsultError, Result};

// Alternation is leftmost-first, so the order here is the match priority.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\w+|[:;]-?\)|[%=]\)|\(+|\)+|!+|\?+|\++\d*").expect("token regex")
});

/// Canonical emoticon every face spelling collapses to.
pub const SMILE: &str = ":)";

/// A normalized token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Pure tokenizer; the only state is the optional stop-word set.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop words are compared against the raw (lower-cased, uncollapsed) match.
    pub fn with_stop_words<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }

    /// Never fails; text without any match yields an empty vector.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let lowered = text.to_lowercase();
        TOKEN_RE
            .find_iter(&lowered)
            .filter_map(|m| self.canonical(m.as_str()))
            .collect()
    }

    /// Boundary variant for untyped (JSON) input: null and non-strings fail fast.
    pub fn tokenize_value(&self, value: &Value) -> Result<Vec<Token>> {
        match value {
            Value::String(s) => Ok(self.tokenize(s)),
            Value::Null => Err(InsultError::Input("text is null".into())),
            other => Err(InsultError::Input(format!(
                "text must be a string, got {}",
                json_kind(other)
            ))),
        }
    }

    fn canonical(&self, raw: &str) -> Option<Token> {
        let first = raw.chars().next()?;
        if first.is_numeric() {
            return None;
        }
        if self.stop_words.contains(raw) {
            return None;
        }
        let canon = match first {
            ':' | ';' | '%' | '=' => SMILE,
            '(' => "(",
            ')' => ")",
            '!' => "!",
            '?' => "?",
            '+' => "+",
            _ => raw,
        };
        Some(Token(canon.to_string()))
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
