//! Reply normalisation: turn the model's text into an [`AnalysisResult`].
//!
//! Models are told to reply with one bare JSON object, but in practice they
//! wrap it in fences, prepend a sentence, rename keys or encode checklists in
//! several shapes. The rules here accept those variations and reject only
//! replies that contain no usable pattern at all.
//!
//! ## Accepted shapes
//!
//! - ```` ```json … ``` ```` fences, or prose around the outermost `{…}`
//! - `{"patterns": [...]}` or a bare top-level `[...]` of patterns
//! - pattern title under `title` / `name` / `standard`,
//!   feedback under `feedback` / `analysis` / `comment`
//! - checklists as one object, an array of objects, or an array of
//!   `{item|name, passed|status|checked|value}` records

use crate::error::AnalysisError;
use crate::model::{AnalysisResult, Checklist, Pattern};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const TITLE_KEYS: &[&str] = &["title", "name", "standard"];
const FEEDBACK_KEYS: &[&str] = &["feedback", "analysis", "comment"];
const ITEM_KEYS: &[&str] = &["item", "name"];
const VALUE_KEYS: &[&str] = &["passed", "status", "checked", "value"];
const TRUTHY_WORDS: &[&str] = &["true", "yes", "sim", "y", "1", "x", "passed", "ok"];

/// Ids the caller supplies when the reply does not carry them.
#[derive(Debug, Clone, Copy)]
pub struct ReplyDefaults<'a> {
    pub organization_id: &'a str,
    pub transcript_id: &'a str,
    pub pilot_id: &'a str,
}

/// Parse and normalise a raw model reply.
///
/// # Errors
/// `MalformedResponse` when no JSON can be located or no pattern survives.
pub fn normalize_reply(
    raw: &str,
    defaults: ReplyDefaults<'_>,
) -> Result<AnalysisResult, AnalysisError> {
    let json = locate_json(raw).ok_or_else(|| AnalysisError::MalformedResponse {
        detail: "no JSON object found in the reply".into(),
    })?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| AnalysisError::MalformedResponse {
            detail: format!("reply is not valid JSON: {}", e),
        })?;

    let (raw_patterns, root) = match &value {
        Value::Array(items) => (items.as_slice(), None),
        Value::Object(obj) => match obj.get("patterns") {
            Some(Value::Array(items)) => (items.as_slice(), Some(obj)),
            _ => {
                return Err(AnalysisError::MalformedResponse {
                    detail: "reply has no `patterns` array".into(),
                })
            }
        },
        _ => {
            return Err(AnalysisError::MalformedResponse {
                detail: "reply is neither an object nor an array".into(),
            })
        }
    };

    let patterns: Vec<Pattern> = raw_patterns
        .iter()
        .enumerate()
        .filter_map(|(idx, p)| normalize_pattern(idx, p))
        .collect();

    if patterns.is_empty() {
        return Err(AnalysisError::MalformedResponse {
            detail: "reply contains no usable patterns".into(),
        });
    }

    let id_or = |key: &str, default: &str| {
        root.and_then(|obj| string_field(obj, &[key]))
            .unwrap_or_else(|| default.to_string())
    };

    let result = AnalysisResult {
        transcript_id: id_or("transcriptId", defaults.transcript_id),
        organization_id: defaults.organization_id.to_string(),
        pilot_id: id_or("pilotId", defaults.pilot_id),
        patterns,
        flight_metadata: None,
    };
    debug!(
        "Normalised reply: {} patterns, transcript={}, pilot={}",
        result.patterns.len(),
        result.transcript_id,
        result.pilot_id
    );
    Ok(result)
}

// ── Locating the JSON ────────────────────────────────────────────────────

static RE_FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)\n?\s*```").unwrap());

/// The JSON text inside the reply, without fences or surrounding prose.
fn locate_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let body = match RE_FENCED.captures(trimmed).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim(),
        None => trimmed,
    };

    let (open, close) = if body.starts_with('[') {
        ('[', ']')
    } else {
        ('{', '}')
    };
    let start = body.find(open)?;
    let end = body.rfind(close)?;
    (start < end).then(|| &body[start..=end])
}

// ── Patterns ─────────────────────────────────────────────────────────────

fn normalize_pattern(idx: usize, value: &Value) -> Option<Pattern> {
    let Some(obj) = value.as_object() else {
        warn!("Pattern {} is not an object; skipped", idx + 1);
        return None;
    };
    let Some(title) = string_field(obj, TITLE_KEYS) else {
        warn!("Pattern {} has no title; skipped", idx + 1);
        return None;
    };
    let feedback = string_field(obj, FEEDBACK_KEYS).unwrap_or_default();

    let checklists = obj
        .get("checklists")
        .or_else(|| obj.get("checklist"))
        .map(normalize_checklists)
        .unwrap_or_default();

    Some(Pattern {
        title,
        feedback,
        checklists,
    })
}

fn normalize_checklists(value: &Value) -> Vec<Checklist> {
    match value {
        Value::Object(obj) => vec![checklist_from_map(obj)],
        Value::Array(entries) => {
            let mut checklists = Vec::new();
            let mut records = Checklist::new();
            for entry in entries {
                let Some(obj) = entry.as_object() else {
                    continue;
                };
                match record_item(obj) {
                    Some((item, passed)) => records.insert(item, passed),
                    None => {
                        let checklist = checklist_from_map(obj);
                        if !checklist.is_empty() {
                            checklists.push(checklist);
                        }
                    }
                }
            }
            if !records.is_empty() {
                checklists.push(records);
            }
            checklists
        }
        _ => Vec::new(),
    }
}

fn checklist_from_map(obj: &Map<String, Value>) -> Checklist {
    let mut checklist = Checklist::new();
    for (item, value) in obj {
        checklist.insert(item.trim(), truthy(value));
    }
    checklist
}

/// `{"item": "...", "passed": true}`-style record, if `obj` is one.
fn record_item(obj: &Map<String, Value>) -> Option<(String, bool)> {
    let item = string_field(obj, ITEM_KEYS)?;
    let value = VALUE_KEYS.iter().find_map(|k| obj.get(*k))?;
    Some((item, truthy(value)))
}

/// First non-empty string under any of `keys`.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Lenient boolean coercion for checklist values.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            TRUTHY_WORDS.contains(&s.as_str())
        }
        _ => false,
    }
}
