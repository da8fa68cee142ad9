//! Extraction of structured action directives from model replies.
//!
//! The model requests a local action by embedding one fenced block:
//!
//! ````text
//! ```json
//! {"action": "send_email", "recipient": "hr@example.com", "subject": "<unresolved>"}
//! ```
//! ````
//!
//! Values equal to (or containing) [`UNRESOLVED_MARKER`], empty strings and
//! `null` are all converted to `None` here, so nothing past this module
//! deals with magic strings.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::DirectiveError;

/// Value the model uses for a parameter it could not determine
pub const UNRESOLVED_MARKER: &str = "<unresolved>";

/// An action request parsed out of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub action: String,
    /// Every parameter the model mentioned; None when it was unresolved
    pub params: BTreeMap<String, Option<String>>,
}

impl Directive {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: BTreeMap::new(),
        }
    }

    /// Resolved value of a parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(|v| v.as_deref())
    }

    /// Required parameters that are absent or unresolved, in `required` order
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.param(name).is_none())
            .collect()
    }

    /// Fill in a parameter; blank or sentinel values leave it unresolved
    pub fn supply(&mut self, name: &str, value: &str) {
        self.params.insert(name.to_string(), resolve_text(value));
    }
}

/// What a reply contained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Plain conversational text
    NoDirective,
    Directive(Directive),
    /// A directive block was present but unusable
    Malformed(DirectiveError),
}

fn is_unresolved(value: &str) -> bool {
    value.to_lowercase().contains(UNRESOLVED_MARKER)
}

fn resolve_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_unresolved(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => resolve_text(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Fenced blocks that may hold a directive: tagged `json`/`directive`, or
/// untagged with a body starting with `{`.
///
/// A multi-line block closes on a fence at the start of a line or right
/// after a closing brace, so fences inside JSON strings do not end it. A
/// block may also sit on one line: ```` ```json {"action": "..."}``` ````.
fn candidate_blocks(reply: &str) -> Vec<String> {
    let fence_re = Regex::new(
        r"(?s)```[ \t]*([A-Za-z_-]*)[ \t]*(?:\r?\n(.*?(?:\r?\n|\})[ \t]*)|(\{[^\n]*\})[ \t]*)```",
    )
    .unwrap();

    fence_re
        .captures_iter(reply)
        .filter_map(|caps| {
            let tag = caps.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
            let body = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            let tagged = tag == "json" || tag == "directive";
            if tagged || (tag.is_empty() && body.starts_with('{')) {
                Some(body.to_string())
            } else {
                None
            }
        })
        .collect()
}

/// Parse the body of one block
pub fn parse_block(body: &str) -> Result<Directive, DirectiveError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| DirectiveError::InvalidJson(e.to_string()))?;
    let object: Map<String, Value> = match value {
        Value::Object(map) => map,
        _ => return Err(DirectiveError::NotAnObject),
    };

    let action = object
        .get("action")
        .and_then(|a| a.as_str())
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or(DirectiveError::MissingAction)?
        .to_string();

    let params = object
        .iter()
        .filter(|(k, _)| k.as_str() != "action")
        .map(|(k, v)| (k.clone(), resolve_value(v)))
        .collect();

    Ok(Directive { action, params })
}

/// Look for a directive in a model reply.
///
/// The first block that parses wins. If none parses but at least one
/// candidate block was present, the first failure is reported.
pub fn parse_reply(reply: &str) -> ParseOutcome {
    let mut first_error = None;

    for block in candidate_blocks(reply) {
        match parse_block(&block) {
            Ok(directive) => {
                debug!("Found directive '{}' with {} params", directive.action, directive.params.len());
                return ParseOutcome::Directive(directive);
            }
            Err(e) => {
                debug!("Skipping unusable directive block: {}", e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => ParseOutcome::Malformed(e),
        None => ParseOutcome::NoDirective,
    }
}
