//! Agent registry
//!
//! Holds the agent catalog, the LLM factory, and the shared tool registry,
//! and instantiates [`RoleAgent`]s on demand. Per-agent rate limiters are
//! built once at registry construction so an agent's rolling window spans
//! every task (and delegation) it serves within a run.

use crate::agents::role::RoleAgent;
use crate::llm::{LlmFactory, RateLimiter, RetryPolicy};
use crate::tools::ToolRegistry;
use crate::types::{MuseError, Result};
use crate::utils::toml_config::{AgentConfig, MuseConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub struct AgentRegistry {
    configs: HashMap<String, AgentConfig>,
    llm_factory: Arc<dyn LlmFactory>,
    tool_registry: Arc<ToolRegistry>,
    limiters: HashMap<String, Arc<RateLimiter>>,
    global_limiter: Option<Arc<RateLimiter>>,
    retry: RetryPolicy,
    max_delegation_depth: usize,
}

impl AgentRegistry {
    pub fn new(
        configs: HashMap<String, AgentConfig>,
        llm_factory: Arc<dyn LlmFactory>,
        tool_registry: Arc<ToolRegistry>,
        global_limiter: Option<Arc<RateLimiter>>,
        max_delegation_depth: usize,
    ) -> Self {
        let limiters = configs
            .iter()
            .filter_map(|(name, config)| {
                config
                    .max_rpm
                    .map(|rpm| (name.clone(), Arc::new(RateLimiter::per_minute(rpm))))
            })
            .collect();

        for (name, config) in &configs {
            for tool in &config.tools {
                if !tool_registry.has_tool(tool) {
                    warn!(agent = %name, %tool, "agent references an unregistered tool");
                }
            }
        }

        Self {
            configs,
            llm_factory,
            tool_registry,
            limiters,
            global_limiter,
            retry: RetryPolicy::default(),
            max_delegation_depth,
        }
    }

    pub fn from_config(
        config: &MuseConfig,
        llm_factory: Arc<dyn LlmFactory>,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        let global_limiter = config
            .pipeline
            .max_rpm
            .map(|rpm| Arc::new(RateLimiter::per_minute(rpm)));

        Self::new(
            config.agents.clone(),
            llm_factory,
            tool_registry,
            global_limiter,
            config.pipeline.max_delegation_depth,
        )
    }

    pub fn has_agent(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get_config(&self, name: &str) -> Option<&AgentConfig> {
        self.configs.get(name)
    }

    /// The pipeline-wide limiter shared by every agent (and the planner).
    pub fn global_limiter(&self) -> Option<Arc<RateLimiter>> {
        self.global_limiter.clone()
    }

    /// One line per co-agent, used in the delegation tool description.
    pub fn roster_summary(&self, excluding: &str) -> String {
        let mut entries: Vec<String> = self
            .configs
            .iter()
            .filter(|(name, _)| name.as_str() != excluding)
            .map(|(name, config)| format!("{} ({})", name, config.role))
            .collect();
        entries.sort();
        entries.join(", ")
    }

    /// Create an agent instance by catalog name.
    pub async fn create_agent(self: Arc<Self>, name: &str) -> Result<RoleAgent> {
        let config = self.configs.get(name).ok_or_else(|| {
            MuseError::Config(format!("agent '{}' is not in the catalog", name))
        })?;

        let llm = self.llm_factory.client_for_model(&config.model).await?;

        Ok(RoleAgent::new(
            name.to_string(),
            config.clone(),
            llm,
            Arc::clone(&self.tool_registry),
            self.limiters.get(name).cloned(),
            self.global_limiter.clone(),
            self.retry,
            Arc::clone(&self),
            self.max_delegation_depth,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmClient, LlmResponse};
    use crate::types::ToolDefinition;
    use async_trait::async_trait;

    struct StaticLlm(String);

    #[async_trait]
    impl LlmClient for StaticLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
        async fn generate_with_history(&self, _messages: &[(String, String)]) -> Result<String> {
            Ok(self.0.clone())
        }
        async fn generate_with_tools(
            &self,
            _messages: &[(String, String)],
            _tools: &[ToolDefinition],
        ) -> Result<LlmResponse> {
            Ok(LlmResponse {
                content: self.0.clone(),
                tool_calls: vec![],
                finish_reason: "stop".to_string(),
            })
        }
        fn model_name(&self) -> &str {
            "static"
        }
    }

    struct StaticFactory;

    #[async_trait]
    impl LlmFactory for StaticFactory {
        async fn client_for_model(&self, _model: &str) -> Result<Arc<dyn LlmClient>> {
            Ok(Arc::new(StaticLlm("ok".to_string())))
        }
    }

    fn agent_config() -> AgentConfig {
        AgentConfig {
            role: "Analyst".to_string(),
            goal: "Analyze".to_string(),
            backstory: "Knows things".to_string(),
            model: "default".to_string(),
            tools: vec![],
            allow_delegation: false,
            max_iterations: 3,
            max_rpm: Some(2),
            inject_date: false,
            reasoning: false,
        }
    }

    #[tokio::test]
    async fn create_agent_resolves_catalog_entries() {
        let registry = Arc::new(AgentRegistry::new(
            HashMap::from([("analyst".to_string(), agent_config())]),
            Arc::new(StaticFactory),
            Arc::new(ToolRegistry::new()),
            None,
            1,
        ));

        let agent = registry.clone().create_agent("analyst").await.unwrap();
        assert_eq!(agent.model_name(), "static");
        assert!(registry.clone().create_agent("ghost").await.is_err());
    }

    #[tokio::test]
    async fn roster_excludes_the_asking_agent() {
        let mut configs = HashMap::new();
        configs.insert("analyst".to_string(), agent_config());
        let mut writer = agent_config();
        writer.role = "Writer".to_string();
        configs.insert("writer".to_string(), writer);

        let registry = Arc::new(AgentRegistry::new(
            configs,
            Arc::new(StaticFactory),
            Arc::new(ToolRegistry::new()),
            None,
            1,
        ));

        let roster = registry.roster_summary("analyst");
        assert!(roster.contains("writer (Writer)"));
        assert!(!roster.contains("analyst"));
    }
}
