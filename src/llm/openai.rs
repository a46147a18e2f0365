use crate::llm::client::{LlmClient, LlmResponse, SamplingParams};
use crate::types::{MuseError, Result, ToolCall, ToolDefinition};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
        ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    params: SamplingParams,
}

impl OpenAiClient {
    pub fn new(api_key: String, api_base: String, model: String, params: SamplingParams) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
            params,
        }
    }

    fn to_chat_messages(messages: &[(String, String)]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|(role, content)| match role.as_str() {
                "system" => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage::from(content.clone()),
                ),
                "assistant" => ChatCompletionRequestMessage::Assistant(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(content.clone())
                        .build()
                        .unwrap_or_default(),
                ),
                _ => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                    content.clone(),
                )),
            })
            .collect()
    }

    async fn chat(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.params.temperature)
            .messages(messages)
            .build()
            .map_err(|e| MuseError::Llm(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| MuseError::Llm(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| MuseError::Llm("No response from OpenAI".to_string()))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(Self::to_chat_messages(&[(
            "user".to_string(),
            prompt.to_string(),
        )]))
        .await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(Self::to_chat_messages(&[
            ("system".to_string(), system.to_string()),
            ("user".to_string(), prompt.to_string()),
        ]))
        .await
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        self.chat(Self::to_chat_messages(messages)).await
    }

    async fn generate_with_tools(
        &self,
        messages: &[(String, String)],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let openai_tools: Vec<ChatCompletionTool> = tools
            .iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: async_openai::types::FunctionObject {
                    name: tool.name.clone(),
                    description: Some(tool.description.clone()),
                    parameters: Some(tool.parameters.clone()),
                    strict: None,
                },
            })
            .collect();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.params.temperature)
            .messages(Self::to_chat_messages(messages))
            .tools(openai_tools)
            .tool_choice(ChatCompletionToolChoiceOption::Auto)
            .build()
            .map_err(|e| MuseError::Llm(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| MuseError::Llm(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MuseError::Llm("No response from OpenAI".to_string()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: serde_json::from_str(&call.function.arguments)
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();

        let finish_reason = if tool_calls.is_empty() {
            "stop".to_string()
        } else {
            "tool_calls".to_string()
        };

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
