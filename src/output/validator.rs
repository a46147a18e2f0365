//! Fail-closed validation of structured task output
//!
//! Model text is best-effort JSON: it may arrive wrapped in markdown fences
//! or prose. Extraction tolerates that; validation does not. Missing,
//! unexpected, and mistyped fields each fail with the offending field names
//! in the error, and absent required fields are never silently defaulted.

use crate::types::{ContentRecord, MuseError, Result};
use serde_json::Value;

/// Required fields of a [`ContentRecord`] and their expected shapes.
const REQUIRED_FIELDS: &[(&str, FieldKind)] = &[
    ("content_type", FieldKind::Text),
    ("topic", FieldKind::Text),
    ("target_audience", FieldKind::Text),
    ("tags", FieldKind::TextArray),
    ("content", FieldKind::Text),
];

#[derive(Clone, Copy, PartialEq)]
enum FieldKind {
    Text,
    TextArray,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.is_string(),
            FieldKind::TextArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::TextArray => "array of strings",
        }
    }
}

/// Validate raw model text as a [`ContentRecord`].
pub fn validate_content(raw: &str) -> Result<ContentRecord> {
    let value = extract_json(raw)?;
    check_fields(&value)?;
    serde_json::from_value(value).map_err(|e| MuseError::Validation(e.to_string()))
}

/// Pull the first JSON object out of model text, tolerating markdown fences
/// and surrounding prose.
fn extract_json(raw: &str) -> Result<Value> {
    let start = raw.find('{');
    let end = raw.rfind('}');
    let slice = match (start, end) {
        (Some(s), Some(e)) if s < e => &raw[s..=e],
        _ => {
            return Err(MuseError::Validation(
                "output contains no JSON object".to_string(),
            ))
        }
    };

    serde_json::from_str(slice)
        .map_err(|e| MuseError::Validation(format!("output is not valid JSON: {}", e)))
}

fn check_fields(value: &Value) -> Result<()> {
    let object = value.as_object().ok_or_else(|| {
        MuseError::Validation("output JSON is not an object".to_string())
    })?;

    let mut missing = Vec::new();
    let mut mistyped = Vec::new();
    for (name, kind) in REQUIRED_FIELDS {
        match object.get(*name) {
            None | Some(Value::Null) => missing.push(*name),
            Some(found) if !kind.matches(found) => {
                mistyped.push(format!("{} (expected {})", name, kind.describe()))
            }
            Some(_) => {}
        }
    }

    let unexpected: Vec<&str> = object
        .keys()
        .filter(|key| !REQUIRED_FIELDS.iter().any(|(name, _)| name == &key.as_str()))
        .map(|key| key.as_str())
        .collect();

    if missing.is_empty() && mistyped.is_empty() && unexpected.is_empty() {
        return Ok(());
    }

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing field(s): {}", missing.join(", ")));
    }
    if !mistyped.is_empty() {
        parts.push(format!("mistyped field(s): {}", mistyped.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!("unexpected field(s): {}", unexpected.join(", ")));
    }
    Err(MuseError::Validation(parts.join("; ")))
}

/// Prompt block describing the expected JSON shape, generated from the
/// record's schema.
pub fn schema_instructions() -> String {
    let schema = schemars::schema_for!(ContentRecord);
    let rendered = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "Respond with ONLY a JSON object matching this schema, no prose and no markdown fences:\n{}",
        rendered
    )
}
