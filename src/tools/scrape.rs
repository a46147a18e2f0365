//! Page scraping tool
//!
//! Fetches a page over HTTP and reduces it to readable text, optionally
//! narrowed to a CSS selector. Script and style content is dropped.

use crate::tools::registry::Tool;
use crate::types::{MuseError, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::{json, Value};

const MAX_TEXT_CHARS: usize = 12_000;

pub struct ScrapeTool {
    http: reqwest::Client,
}

impl ScrapeTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    fn extract_text(html: &str, selector: Option<&str>) -> Result<String> {
        let document = Html::parse_document(html);

        let selector = match selector {
            Some(raw) => Selector::parse(raw)
                .map_err(|e| MuseError::Tool(format!("invalid selector '{}': {}", raw, e)))?,
            None => Selector::parse("body")
                .map_err(|e| MuseError::Tool(format!("selector parse error: {}", e)))?,
        };

        let mut chunks: Vec<String> = Vec::new();
        for element in document.select(&selector) {
            collect_visible_text(*element, &mut chunks);
        }

        let mut text = chunks.join(" ");
        text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.len() > MAX_TEXT_CHARS {
            let mut cut = MAX_TEXT_CHARS;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        Ok(text)
    }
}

/// Depth-first text collection that skips script, style, and noscript
/// subtrees entirely.
fn collect_visible_text(node: ego_tree::NodeRef<'_, scraper::Node>, out: &mut Vec<String>) {
    for child in node.children() {
        match child.value() {
            scraper::Node::Element(element) => {
                if !matches!(element.name(), "script" | "style" | "noscript") {
                    collect_visible_text(child, out);
                }
            }
            scraper::Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            _ => {}
        }
    }
}

impl Default for ScrapeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ScrapeTool {
    fn name(&self) -> &str {
        "scrape_website"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its visible text content"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the page to scrape"
                },
                "selector": {
                    "type": "string",
                    "description": "Optional CSS selector to extract specific content"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuseError::Tool("'url' is required".to_string()))?;
        let selector = args.get("selector").and_then(|v| v.as_str());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MuseError::Tool(format!("fetch failed for '{}': {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MuseError::Tool(format!(
                "fetch failed for '{}': HTTP {}",
                url, status
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| MuseError::Tool(format!("fetch failed for '{}': {}", url, e)))?;

        let text = Self::extract_text(&html, selector)?;

        Ok(json!({
            "url": url,
            "text": text,
            "chars": text.len()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_visible_text() {
        let html = r#"
            <html><head><style>.x{color:red}</style></head>
            <body><h1>Title</h1><p>First   paragraph.</p>
            <script>var ignored = 1;</script></body></html>
        "#;
        let text = ScrapeTool::extract_text(html, None).unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("First paragraph."));
        assert!(!text.contains("ignored"));
        assert!(!text.contains("color:red"));
    }

    #[test]
    fn selector_narrows_extraction() {
        let html = r#"<body><div id="a">keep</div><div id="b">drop</div></body>"#;
        let text = ScrapeTool::extract_text(html, Some("#a")).unwrap();
        assert_eq!(text, "keep");
    }

    #[test]
    fn invalid_selector_is_a_tool_error() {
        let result = ScrapeTool::extract_text("<body></body>", Some("<<<"));
        assert!(matches!(result, Err(MuseError::Tool(_))));
    }

    #[tokio::test]
    async fn missing_url_fails() {
        let tool = ScrapeTool::new();
        let result = tool.execute(json!({})).await;
        assert!(matches!(result, Err(MuseError::Tool(_))));
    }
}
