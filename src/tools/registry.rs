use crate::types::{MuseError, Result, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with the full pipeline capability set: web search,
    /// page scrape, and the file tools scoped to `scope_root`.
    pub fn with_pipeline_tools(scope_root: impl AsRef<Path>) -> Self {
        let mut registry = Self::new();
        let scope = crate::tools::fs::PathScope::new(scope_root);
        let locks = Arc::new(crate::tools::fs::PathLocks::new());

        registry.register(Arc::new(crate::tools::search::SearchTool::new()));
        registry.register(Arc::new(crate::tools::scrape::ScrapeTool::new()));
        registry.register(Arc::new(crate::tools::fs::DirectoryReadTool::new(
            scope.clone(),
        )));
        registry.register(Arc::new(crate::tools::fs::FileReadTool::new(scope.clone())));
        registry.register(Arc::new(crate::tools::fs::FileWriteTool::new(scope, locks)));

        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Definitions filtered down to an agent's allow-list. Unknown names in
    /// the allow-list are simply absent from the result; the loader already
    /// warned about them.
    pub fn get_tool_definitions_for(&self, allowed: &[String]) -> Vec<ToolDefinition> {
        allowed
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        match self.tools.get(name) {
            Some(tool) => tool.execute(args).await,
            None => Err(MuseError::Tool(format!("Tool not found: {}", name))),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}
