// src/discussion.rs
//! Discussion trees: data model, JSON boundary, flattening into training
//! samples, and the tree walker that attaches predicted labels.
//!
//! Corpus JSON: `[{"root": Message}, ...]` with
//! `Message = {"text"?: string, "insult"?: bool, "children"?: [Message]}`.
//! Unknown fields are kept and written back unchanged, and so is an explicit
//! `"children": []`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{InsultError, Result};
use crate::tokenizer::json_kind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insult: Option<bool>,
    /// `None` when the key was absent; `Some(vec![])` for `"children": []`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Message>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn labeled(text: impl Into<String>, insult: bool) -> Self {
        Self {
            insult: Some(insult),
            ..Self::new(text)
        }
    }

    pub fn with_children(mut self, children: Vec<Message>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn children(&self) -> &[Message] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(Message::size).sum::<usize>()
    }

    /// Pre-order visit of the subtree.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Message)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub root: Message,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Discussion {
    pub fn new(root: Message) -> Self {
        Self {
            root,
            extra: Map::new(),
        }
    }
}

/// (text, label): the unit the classifier trains on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub text: String,
    pub label: bool,
}

impl LabeledSample {
    pub fn new(text: impl Into<String>, label: bool) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Anything that can label a batch of non-empty texts, one label per text.
pub trait MessageClassifier: Sync {
    fn classify(&self, texts: &[&str]) -> Result<Vec<bool>>;
}

/* ----------------------------
JSON boundary
---------------------------- */

/// Parse a corpus from JSON text. See [`parse_corpus_value`].
pub fn parse_corpus(json: &str) -> Result<Vec<Discussion>> {
    let value: Value = serde_json::from_str(json)?;
    parse_corpus_value(value)
}

/// Validate and convert an untyped corpus. `text` must be a string when present;
/// `null` or any other type is an input error naming the offending path.
pub fn parse_corpus_value(value: Value) -> Result<Vec<Discussion>> {
    let roots = value
        .as_array()
        .ok_or_else(|| InsultError::Input(format!("corpus must be an array, got {}", json_kind(&value))))?;
    for (i, d) in roots.iter().enumerate() {
        let root = d
            .get("root")
            .ok_or_else(|| InsultError::Input(format!("[{i}] has no `root`")))?;
        validate_node(root, &format!("[{i}].root"))?;
    }
    serde_json::from_value(value).map_err(|e| InsultError::Input(e.to_string()))
}

fn validate_node(node: &Value, path: &str) -> Result<()> {
    let obj = node
        .as_object()
        .ok_or_else(|| InsultError::Input(format!("{path} must be an object, got {}", json_kind(node))))?;
    if let Some(text) = obj.get("text") {
        if !text.is_string() {
            return Err(InsultError::Input(format!(
                "{path}.text must be a string, got {}",
                json_kind(text)
            )));
        }
    }
    match obj.get("children") {
        None => {}
        Some(Value::Array(children)) => {
            for (i, c) in children.iter().enumerate() {
                validate_node(c, &format!("{path}.children[{i}]"))?;
            }
        }
        Some(other) => {
            return Err(InsultError::Input(format!(
                "{path}.children must be an array, got {}",
                json_kind(other)
            )))
        }
    }
    Ok(())
}

/* ----------------------------
Flattening
---------------------------- */

/// Every message with non-empty text and a known label, in pre-order, root by root.
/// Nodes without a usable sample are still descended into.
pub fn labeled_samples(discussions: &[Discussion]) -> Vec<LabeledSample> {
    let mut out = Vec::new();
    for d in discussions {
        d.root.visit(&mut |m| {
            if let (Some(text), Some(label)) = (m.text.as_deref(), m.insult) {
                if !text.is_empty() {
                    out.push(LabeledSample::new(text, label));
                }
            }
        });
    }
    out
}

/* ----------------------------
Tree walker
---------------------------- */

/// Return a labeled copy of `root`, same shape and child order.
///
/// - empty text → `false`, classifier not consulted
/// - non-empty text → classifier label (one batched call per tree)
/// - no `text` field → label left as it was
///
/// Labels are per node; a parent's outcome never affects its children.
pub fn label_tree<M>(root: &Message, classifier: &M) -> Result<Message>
where
    M: MessageClassifier + ?Sized,
{
    let mut texts: Vec<&str> = Vec::new();
    root.visit(&mut |m| {
        if let Some(t) = m.text.as_deref() {
            if !t.is_empty() {
                texts.push(t);
            }
        }
    });

    let labels = if texts.is_empty() {
        Vec::new()
    } else {
        classifier.classify(&texts)?
    };
    if labels.len() != texts.len() {
        return Err(InsultError::Classifier(format!(
            "{} labels returned for {} texts",
            labels.len(),
            texts.len()
        )));
    }

    let mut labels = labels.into_iter();
    Ok(rebuild(root, &mut labels))
}

fn rebuild(node: &Message, labels: &mut impl Iterator<Item = bool>) -> Message {
    let insult = match node.text.as_deref() {
        Some("") => Some(false),
        Some(_) => labels.next(),
        None => node.insult,
    };
    Message {
        text: node.text.clone(),
        insult,
        children: node
            .children
            .as_ref()
            .map(|cs| cs.iter().map(|c| rebuild(c, &mut *labels)).collect()),
        extra: node.extra.clone(),
    }
}

/// Label every discussion independently; roots are processed in parallel.
pub fn label_forest<M>(discussions: &[Discussion], classifier: &M) -> Result<Vec<Discussion>>
where
    M: MessageClassifier + ?Sized,
{
    discussions
        .par_iter()
        .map(|d| {
            Ok(Discussion {
                root: label_tree(&d.root, classifier)?,
                extra: d.extra.clone(),
            })
        })
        .collect()
}
