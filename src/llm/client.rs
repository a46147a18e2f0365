use crate::types::{MuseError, Result, ToolCall, ToolDefinition};
use crate::utils::toml_config::{ModelConfig, MuseConfig, ProviderConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Generic LLM client trait for provider abstraction
///
/// All providers implement this trait, allowing agents to swap between
/// them without changing any orchestration code. Conversation history is a
/// flat list of `(role, content)` pairs with roles `system`, `user` and
/// `assistant`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion from a bare prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with a system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate with conversation history
    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String>;

    /// Generate with tool calling support over a conversation history
    async fn generate_with_tools(
        &self,
        messages: &[(String, String)],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Response from an LLM generation request
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g. "stop", "tool_calls", "length")
    pub finish_reason: String,
}

/// Sampling parameters resolved from a [`ModelConfig`]
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&ModelConfig> for SamplingParams {
    fn from(model: &ModelConfig) -> Self {
        Self {
            temperature: model.temperature,
            max_tokens: model.max_tokens,
        }
    }
}

/// Provider enum for runtime selection
///
/// Variants exist regardless of enabled features so that any configuration
/// file parses; creating a client for a provider compiled out of this build
/// fails with a `Config` error naming the missing feature.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Gemini API (API-key mode)
    Gemini {
        api_key: String,
        base_url: String,
        model: String,
        params: SamplingParams,
    },

    /// Ollama local LLM server
    Ollama {
        base_url: String,
        model: String,
        params: SamplingParams,
    },

    /// OpenAI API (including compatible endpoints)
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        params: SamplingParams,
    },
}

impl Provider {
    /// Create a client instance for this provider
    pub async fn create_client(&self) -> Result<Arc<dyn LlmClient>> {
        match self {
            Provider::Gemini {
                api_key,
                base_url,
                model,
                params,
            } => Ok(Arc::new(super::gemini::GeminiClient::new(
                api_key.clone(),
                base_url.clone(),
                model.clone(),
                *params,
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                params,
            } => Ok(Arc::new(super::ollama::OllamaClient::new(
                base_url.clone(),
                model.clone(),
                *params,
            ))),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { model, .. } => Err(MuseError::Config(format!(
                "model '{}' needs the 'ollama' feature, which this build lacks",
                model
            ))),

            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Arc::new(super::openai::OpenAiClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *params,
            ))),

            #[cfg(not(feature = "openai"))]
            Provider::OpenAI { model, .. } => Err(MuseError::Config(format!(
                "model '{}' needs the 'openai' feature, which this build lacks",
                model
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::Ollama { .. } => "Ollama",
            Provider::OpenAI { .. } => "OpenAI",
        }
    }
}

/// Factory abstraction the agent registry depends on. The production
/// implementation is [`ProviderRegistry`]; tests substitute scripted mocks.
#[async_trait]
pub trait LlmFactory: Send + Sync {
    /// Resolve a named model configuration to a ready client
    async fn client_for_model(&self, model: &str) -> Result<Arc<dyn LlmClient>>;
}

/// Registry of named providers and models from the configuration
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConfig>,
    models: HashMap<String, ModelConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            models: HashMap::new(),
        }
    }

    pub fn from_config(config: &MuseConfig) -> Self {
        Self {
            providers: config.providers.clone(),
            models: config.models.clone(),
        }
    }

    pub fn register_provider(&mut self, name: &str, provider: ProviderConfig) {
        self.providers.insert(name.to_string(), provider);
    }

    pub fn register_model(&mut self, name: &str, model: ModelConfig) {
        self.models.insert(name.to_string(), model);
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Resolve a named model to a concrete [`Provider`], reading API keys
    /// from the environment variables named in the provider config.
    pub fn resolve(&self, model_name: &str) -> Result<Provider> {
        let model = self.models.get(model_name).ok_or_else(|| {
            MuseError::Config(format!("model '{}' is not configured", model_name))
        })?;
        let provider = self.providers.get(&model.provider).ok_or_else(|| {
            MuseError::Config(format!(
                "model '{}' references unknown provider '{}'",
                model_name, model.provider
            ))
        })?;
        let params = SamplingParams::from(model);

        match provider {
            ProviderConfig::Gemini {
                api_key_env,
                base_url,
            } => {
                let api_key = read_key_env(api_key_env)?;
                Ok(Provider::Gemini {
                    api_key,
                    base_url: base_url.clone(),
                    model: model.model.clone(),
                    params,
                })
            }
            ProviderConfig::Ollama { base_url } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.model.clone(),
                params,
            }),
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
            } => {
                let api_key = read_key_env(api_key_env)?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.model.clone(),
                    params,
                })
            }
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmFactory for ProviderRegistry {
    async fn client_for_model(&self, model: &str) -> Result<Arc<dyn LlmClient>> {
        self.resolve(model)?.create_client().await
    }
}

fn read_key_env(var: &str) -> Result<String> {
    std::env::var(var)
        .map_err(|_| MuseError::Config(format!("environment variable '{}' is not set", var)))
}
