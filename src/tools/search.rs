//! Web search tool backed by daedra (DuckDuckGo)

use crate::tools::registry::Tool;
use crate::types::{MuseError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct SearchTool;

impl SearchTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and return ranked results with titles, URLs, and snippets"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 10)",
                    "default": 10
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuseError::Tool("'query' is required".to_string()))?;

        let max_results = args
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(10);

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: max_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| MuseError::Tool(format!("search failed: {}", e)))?;

        let results: Vec<Value> = response
            .data
            .iter()
            .enumerate()
            .map(|(rank, r)| {
                json!({
                    "rank": rank + 1,
                    "title": r.title,
                    "url": r.url,
                    "snippet": r.description
                })
            })
            .collect();

        Ok(json!({
            "query": query,
            "count": results.len(),
            "results": results
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition_is_well_formed() {
        let tool = SearchTool::new();
        assert_eq!(tool.name(), "web_search");
        let schema = tool.parameters_schema();
        assert!(schema["properties"]["query"].is_object());
    }

    #[tokio::test]
    async fn missing_query_fails() {
        let tool = SearchTool::new();
        let result = tool.execute(json!({})).await;
        assert!(matches!(result, Err(MuseError::Tool(_))));
    }
}
