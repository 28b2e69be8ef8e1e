// src/lexicon.rs
//! Lexicon matcher: classifies one token against the address, insult and
//! weak-insult word lists.
//!
//! Each list entry is a regex fragment; a list compiles into a single anchored
//! matcher `^(?:e1|e2|...)$`, so matching is always whole-token, never substring.
//! Precedence is fixed: Address, then Insult, then WeakInsult.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{InsultError, Result};
use crate::tokenizer::Tokenizer;

/// Category of a single token. Exactly one per token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WordCategory {
    Insult,
    Address,
    WeakInsult,
    /// No list matched.
    Neutral,
}

/// Raw word lists as they appear in `[lexicon]` of the detector config.
/// Inside a present section a missing list is empty; an absent section is the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconConfig {
    #[serde(default)]
    pub insult: Vec<String>,
    #[serde(default)]
    pub address: Vec<String>,
    #[serde(default)]
    pub weak_insult: Vec<String>,
    #[serde(default)]
    pub stop_words: Vec<String>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl LexiconConfig {
    /// Built-in English seed lists, used when the config has no `[lexicon]` section.
    pub fn default_seed() -> Self {
        fn owned(v: &[&str]) -> Vec<String> {
            v.iter().map(|s| s.to_string()).collect()
        }
        Self {
            insult: owned(&[
                "idiots?",
                "morons?",
                "stupid",
                "dumb",
                "dumbass",
                "fools?",
                "imbeciles?",
                "cretins?",
                "losers?",
                "jerks?",
                "clowns?",
                "scum",
                "pathetic",
                "dimwits?",
                "halfwits?",
                "twits?",
                "ignoramus",
                "trolls?",
            ]),
            address: owned(&["you", "your", "yours", "yourself", "yourselves", "u", "ur", "ya"]),
            weak_insult: owned(&[
                "silly",
                "clueless",
                "crazy",
                "ugly",
                "lame",
                "lazy",
                "ignorant",
                "naive",
                "shameless",
                "garbage",
                "trash",
                "nonsense",
            ]),
            stop_words: Vec::new(),
        }
    }

    /// Tokenizer configured with this lexicon's stop words.
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::with_stop_words(&self.stop_words)
    }
}

/// Compiled whole-token matchers. Immutable; rebuild to reload.
#[derive(Debug, Clone)]
pub struct Lexicon {
    address: Option<Regex>,
    insult: Option<Regex>,
    weak_insult: Option<Regex>,
}

impl Lexicon {
    /// Compile all three lists. Any invalid entry fails the whole lexicon.
    pub fn from_config(cfg: &LexiconConfig) -> Result<Self> {
        Ok(Self {
            address: compile_list("address", &cfg.address)?,
            insult: compile_list("insult", &cfg.insult)?,
            weak_insult: compile_list("weak_insult", &cfg.weak_insult)?,
        })
    }

    pub fn default_seed() -> Result<Self> {
        Self::from_config(&LexiconConfig::default_seed())
    }

    /// First match wins: Address > Insult > WeakInsult > Neutral.
    pub fn classify(&self, token: &str) -> WordCategory {
        if hit(&self.address, token) {
            WordCategory::Address
        } else if hit(&self.insult, token) {
            WordCategory::Insult
        } else if hit(&self.weak_insult, token) {
            WordCategory::WeakInsult
        } else {
            WordCategory::Neutral
        }
    }
}

#[inline]
fn hit(re: &Option<Regex>, token: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(token))
}

fn compile_list(list: &'static str, entries: &[String]) -> Result<Option<Regex>> {
    let entries: Vec<&str> = entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();
    if entries.is_empty() {
        return Ok(None);
    }

    // Validate entries one by one so the error names the offending entry.
    for e in &entries {
        Regex::new(e).map_err(|source| InsultError::Lexicon {
            list,
            entry: e.to_string(),
            source,
        })?;
    }

    let joined = format!("^(?:{})$", entries.join("|"));
    let re = Regex::new(&joined).map_err(|source| InsultError::Lexicon {
        list,
        entry: joined.clone(),
        source,
    })?;
    Ok(Some(re))
}
