//! Run-scoped execution inputs and template interpolation
//!
//! Instruction templates carry `{key}` placeholders resolved from the run
//! inputs and `{output:task}` placeholders resolved from earlier task
//! outputs. Resolution is strict: an unknown placeholder is a
//! configuration error, never an empty substitution.

use crate::types::{MuseError, Result};
use std::collections::{BTreeMap, HashMap};

/// Key-value inputs supplied at kickoff, read-only while the run executes.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    inputs: BTreeMap<String, String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inputs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inputs.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Inject today's date unless the caller already supplied one.
    pub fn ensure_current_date(&mut self) {
        self.inputs
            .entry("current_date".to_string())
            .or_insert_with(|| chrono::Local::now().format("%Y-%m-%d").to_string());
    }
}

/// Substitute `{key}` and `{output:task}` placeholders in a template.
pub fn interpolate(
    template: &str,
    context: &ExecutionContext,
    outputs: &HashMap<String, String>,
) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut chars = template.char_indices();

    while let Some((start, c)) = chars.next() {
        if c != '{' {
            rendered.push(c);
            continue;
        }

        let mut token = String::new();
        let mut closed = false;
        for (_, inner) in chars.by_ref() {
            if inner == '}' {
                closed = true;
                break;
            }
            token.push(inner);
        }

        if !closed {
            return Err(MuseError::Config(format!(
                "unclosed placeholder at byte {} in template '{}'",
                start, template
            )));
        }

        let value = if let Some(task) = token.strip_prefix("output:") {
            outputs.get(task.trim()).map(String::as_str)
        } else {
            context.get(token.trim())
        };

        match value {
            Some(value) => rendered.push_str(value),
            None => {
                return Err(MuseError::Config(format!(
                    "unresolved placeholder '{{{}}}'",
                    token
                )))
            }
        }
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ExecutionContext {
        ExecutionContext::from_pairs([
            ("product_name", "Study Coach"),
            ("budget", "Rs. 50,000"),
        ])
    }

    #[test]
    fn substitutes_input_placeholders() {
        let rendered = interpolate(
            "Research {product_name} within {budget}.",
            &context(),
            &HashMap::new(),
        )
        .unwrap();
        assert_eq!(rendered, "Research Study Coach within Rs. 50,000.");
    }

    #[test]
    fn substitutes_prior_outputs() {
        let outputs = HashMap::from([(
            "market_research".to_string(),
            "three segments".to_string(),
        )]);
        let rendered = interpolate(
            "Based on {output:market_research}, plan the calendar.",
            &context(),
            &outputs,
        )
        .unwrap();
        assert_eq!(rendered, "Based on three segments, plan the calendar.");
    }

    #[test]
    fn unresolved_placeholder_is_a_config_error() {
        let err = interpolate("Use {missing_key}.", &context(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, MuseError::Config(_)));
        assert!(err.to_string().contains("missing_key"));
    }

    #[test]
    fn unresolved_output_is_a_config_error() {
        let err =
            interpolate("See {output:ghost_task}.", &context(), &HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("output:ghost_task"));
    }

    #[test]
    fn unclosed_placeholder_is_rejected() {
        let err = interpolate("Broken {token", &context(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, MuseError::Config(_)));
    }

    #[test]
    fn current_date_is_injected_once() {
        let mut ctx = ExecutionContext::new();
        ctx.ensure_current_date();
        let injected = ctx.get("current_date").unwrap().to_string();
        assert_eq!(injected.len(), 10);

        let mut preset = ExecutionContext::from_pairs([("current_date", "2026-01-01")]);
        preset.ensure_current_date();
        assert_eq!(preset.get("current_date"), Some("2026-01-01"));
    }
}
