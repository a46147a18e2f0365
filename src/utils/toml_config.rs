//! TOML-based configuration for M.U.S.E
//!
//! A pipeline is described by a root document (`muse.toml`) holding the
//! infrastructure tables (`[pipeline]`, `[providers.*]`, `[models.*]`) and a
//! `[catalogs]` table pointing at two declarative catalogs: the agent
//! catalog (named personas) and the task catalog (an ordered `[[tasks]]`
//! list). The loader parses all three documents and validates every
//! cross-reference before anything runs.

use crate::types::{MuseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from muse.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuseConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Locations of the agent and task catalogs, relative to the root file
    #[serde(default)]
    pub catalogs: CatalogPaths,

    /// Named LLM provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Named model configurations that reference providers
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Agent catalog, filled from the agents document
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,

    /// Task catalog, filled from the tasks document. Order is execution order.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_pipeline_name")]
    pub name: String,

    /// Execution policy. Only sequential is implemented.
    #[serde(default)]
    pub process: ProcessKind,

    /// Run an up-front planning pass that annotates task instructions
    #[serde(default)]
    pub planning: bool,

    /// Model used for the planning pass; falls back to `default`
    pub planning_model: Option<String>,

    /// Pipeline-wide requests-per-minute ceiling across all agents
    pub max_rpm: Option<u32>,

    /// Directory draft artifacts are written to
    #[serde(default = "default_drafts_dir")]
    pub drafts_dir: PathBuf,

    /// Keep executing remaining tasks after a task failure
    #[serde(default)]
    pub continue_on_error: bool,

    /// Re-prompt budget when schema validation rejects a task's output
    #[serde(default = "default_schema_retries")]
    pub schema_retries: u32,

    /// How many delegation hops an agent chain may take
    #[serde(default = "default_delegation_depth")]
    pub max_delegation_depth: usize,
}

fn default_pipeline_name() -> String {
    "muse".to_string()
}

fn default_drafts_dir() -> PathBuf {
    PathBuf::from("drafts")
}

fn default_schema_retries() -> u32 {
    1
}

fn default_delegation_depth() -> usize {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
            process: ProcessKind::Sequential,
            planning: false,
            planning_model: None,
            max_rpm: None,
            drafts_dir: default_drafts_dir(),
            continue_on_error: false,
            schema_retries: default_schema_retries(),
            max_delegation_depth: default_delegation_depth(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessKind {
    #[default]
    Sequential,
}

// ============= Catalog Locations =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPaths {
    #[serde(default = "default_agents_catalog")]
    pub agents: PathBuf,

    #[serde(default = "default_tasks_catalog")]
    pub tasks: PathBuf,
}

fn default_agents_catalog() -> PathBuf {
    PathBuf::from("config/agents.toml")
}

fn default_tasks_catalog() -> PathBuf {
    PathBuf::from("config/tasks.toml")
}

impl Default for CatalogPaths {
    fn default() -> Self {
        Self {
            agents: default_agents_catalog(),
            tasks: default_tasks_catalog(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        /// Environment variable containing the API key
        #[serde(default = "default_gemini_key_env")]
        api_key_env: String,
        #[serde(default = "default_gemini_base")]
        base_url: String,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    OpenAI {
        /// Environment variable containing the API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
    },
}

fn default_gemini_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

// ============= Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference to a provider name defined in [providers]
    pub provider: String,

    /// Model name/identifier to use with the provider
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

// ============= Agent Catalog =============

/// A named persona from the agent catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Short role description, e.g. "Head of Marketing"
    pub role: String,

    /// What the agent is trying to achieve
    pub goal: String,

    /// Persona background folded into the system prompt
    pub backstory: String,

    /// Named model reference from [models]
    #[serde(default = "default_model_ref")]
    pub model: String,

    /// Registered tool names this agent may call
    #[serde(default)]
    pub tools: Vec<String>,

    /// May hand sub-questions to co-agents via the delegate_work tool
    #[serde(default)]
    pub allow_delegation: bool,

    /// Reason-act loop budget
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Per-agent requests-per-minute ceiling (rolling 60 s window)
    pub max_rpm: Option<u32>,

    /// Prepend the run's current date to the system prompt
    #[serde(default)]
    pub inject_date: bool,

    /// Ask the model to think through a short plan before answering
    #[serde(default)]
    pub reasoning: bool,
}

fn default_model_ref() -> String {
    "default".to_string()
}

fn default_max_iterations() -> usize {
    25
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AgentCatalog {
    #[serde(default)]
    agents: HashMap<String, AgentConfig>,
}

// ============= Task Catalog =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSchemaKind {
    /// Validate the task output as a [`crate::types::ContentRecord`]
    Content,
}

/// One entry of the ordered `[[tasks]]` catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub name: String,

    /// Instruction template. `{key}` placeholders resolve from the run
    /// inputs, `{output:task}` from earlier task outputs.
    pub description: String,

    /// What a good result looks like; folded into the prompt
    pub expected_output: String,

    /// Name of the agent that executes this task
    pub agent: String,

    /// Optional structured-output schema the raw result must satisfy
    pub output_schema: Option<OutputSchemaKind>,

    /// Names of earlier tasks whose outputs are attached to this prompt
    #[serde(default)]
    pub context: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskCatalog {
    #[serde(default)]
    tasks: Vec<TaskConfig>,
}

// ============= Loading and Validation =============

impl MuseConfig {
    /// Load the root document and both catalogs, then validate every
    /// cross-reference. Catalog paths resolve relative to the root file's
    /// directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            MuseError::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let mut config: MuseConfig = toml::from_str(&raw)
            .map_err(|e| MuseError::Config(format!("invalid '{}': {}", path.display(), e)))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.agents = load_agent_catalog(&base.join(&config.catalogs.agents))?;
        config.tasks = load_task_catalog(&base.join(&config.catalogs.tasks))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the assembled configuration: task → agent references, task
    /// name uniqueness, and context references that only point backwards.
    /// Model → provider resolution is the provider registry's concern and is
    /// only checked here when a model table is present.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();

        for task in &self.tasks {
            if !seen.insert(task.name.as_str()) {
                return Err(MuseError::Config(format!(
                    "duplicate task name '{}'",
                    task.name
                )));
            }

            if !self.agents.contains_key(&task.agent) {
                return Err(MuseError::Config(format!(
                    "task '{}' references unknown agent '{}'",
                    task.name, task.agent
                )));
            }

            for dep in &task.context {
                if dep == &task.name || !seen.contains(dep.as_str()) {
                    return Err(MuseError::Config(format!(
                        "task '{}' references '{}' in its context, which is not an earlier task",
                        task.name, dep
                    )));
                }
            }
        }

        if !self.models.is_empty() {
            for (name, agent) in &self.agents {
                if !self.models.contains_key(&agent.model) {
                    return Err(MuseError::Config(format!(
                        "agent '{}' references unknown model '{}'",
                        name, agent.model
                    )));
                }
            }
            for (name, model) in &self.models {
                if !self.providers.contains_key(&model.provider) {
                    return Err(MuseError::Config(format!(
                        "model '{}' references unknown provider '{}'",
                        name, model.provider
                    )));
                }
            }
            if let Some(planning_model) = &self.pipeline.planning_model {
                if !self.models.contains_key(planning_model) {
                    return Err(MuseError::Config(format!(
                        "pipeline planning_model '{}' is not a configured model",
                        planning_model
                    )));
                }
            }
        }

        Ok(())
    }

    /// Look up a task by name.
    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

fn load_agent_catalog(path: &Path) -> Result<HashMap<String, AgentConfig>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| MuseError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
    let catalog: AgentCatalog = toml::from_str(&raw)
        .map_err(|e| MuseError::Config(format!("invalid '{}': {}", path.display(), e)))?;
    Ok(catalog.agents)
}

fn load_task_catalog(path: &Path) -> Result<Vec<TaskConfig>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| MuseError::Config(format!("cannot read '{}': {}", path.display(), e)))?;
    let catalog: TaskCatalog = toml::from_str(&raw)
        .map_err(|e| MuseError::Config(format!("invalid '{}': {}", path.display(), e)))?;
    Ok(catalog.tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(role: &str) -> AgentConfig {
        AgentConfig {
            role: role.to_string(),
            goal: "goal".to_string(),
            backstory: "story".to_string(),
            model: "default".to_string(),
            tools: vec![],
            allow_delegation: false,
            max_iterations: 5,
            max_rpm: None,
            inject_date: false,
            reasoning: false,
        }
    }

    fn task(name: &str, agent: &str) -> TaskConfig {
        TaskConfig {
            name: name.to_string(),
            description: "do it".to_string(),
            expected_output: "a thing".to_string(),
            agent: agent.to_string(),
            output_schema: None,
            context: vec![],
        }
    }

    #[test]
    fn parses_agent_catalog_with_defaults() {
        let doc = r#"
            [agents.researcher]
            role = "Market Researcher"
            goal = "Understand the market"
            backstory = "Veteran analyst"
            tools = ["web_search"]
            max_rpm = 1
        "#;

        let catalog: AgentCatalog = toml::from_str(doc).unwrap();
        let agent = &catalog.agents["researcher"];
        assert_eq!(agent.role, "Market Researcher");
        assert_eq!(agent.model, "default");
        assert_eq!(agent.max_iterations, 25);
        assert_eq!(agent.max_rpm, Some(1));
        assert!(!agent.allow_delegation);
    }

    #[test]
    fn parses_task_catalog_preserving_order() {
        let doc = r#"
            [[tasks]]
            name = "research"
            description = "Research {product_name}"
            expected_output = "A report"
            agent = "researcher"

            [[tasks]]
            name = "drafts"
            description = "Write drafts from {output:research}"
            expected_output = "Posts"
            agent = "writer"
            output_schema = "content"
            context = ["research"]
        "#;

        let catalog: TaskCatalog = toml::from_str(doc).unwrap();
        assert_eq!(catalog.tasks.len(), 2);
        assert_eq!(catalog.tasks[0].name, "research");
        assert_eq!(catalog.tasks[1].output_schema, Some(OutputSchemaKind::Content));
        assert_eq!(catalog.tasks[1].context, vec!["research".to_string()]);
    }

    #[test]
    fn validate_rejects_unknown_agent_reference() {
        let config = MuseConfig {
            pipeline: PipelineConfig::default(),
            catalogs: CatalogPaths::default(),
            providers: HashMap::new(),
            models: HashMap::new(),
            agents: HashMap::from([("a".to_string(), agent("A"))]),
            tasks: vec![task("t1", "a"), task("t2", "ghost")],
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn validate_rejects_forward_context_reference() {
        let mut t1 = task("t1", "a");
        t1.context = vec!["t2".to_string()];
        let config = MuseConfig {
            pipeline: PipelineConfig::default(),
            catalogs: CatalogPaths::default(),
            providers: HashMap::new(),
            models: HashMap::new(),
            agents: HashMap::from([("a".to_string(), agent("A"))]),
            tasks: vec![t1, task("t2", "a")],
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_task_names() {
        let config = MuseConfig {
            pipeline: PipelineConfig::default(),
            catalogs: CatalogPaths::default(),
            providers: HashMap::new(),
            models: HashMap::new(),
            agents: HashMap::from([("a".to_string(), agent("A"))]),
            tasks: vec![task("t1", "a"), task("t1", "a")],
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_backward_context() {
        let mut t2 = task("t2", "a");
        t2.context = vec!["t1".to_string()];
        let config = MuseConfig {
            pipeline: PipelineConfig::default(),
            catalogs: CatalogPaths::default(),
            providers: HashMap::new(),
            models: HashMap::new(),
            agents: HashMap::from([("a".to_string(), agent("A"))]),
            tasks: vec![task("t1", "a"), t2],
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn root_document_parses_providers_and_models() {
        let doc = r#"
            [pipeline]
            name = "marketing"
            planning = true
            max_rpm = 10
            drafts_dir = "resources/drafts"

            [providers.gemini-main]
            type = "gemini"

            [models.default]
            provider = "gemini-main"
            model = "gemini-2.0-flash"
            temperature = 0.6
        "#;

        let config: MuseConfig = toml::from_str(doc).unwrap();
        assert_eq!(config.pipeline.name, "marketing");
        assert!(config.pipeline.planning);
        assert_eq!(config.pipeline.max_rpm, Some(10));
        assert_eq!(config.models["default"].temperature, 0.6);
        assert!(matches!(
            config.providers["gemini-main"],
            ProviderConfig::Gemini { .. }
        ));
    }
}
