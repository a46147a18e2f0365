use crate::llm::client::{LlmClient, LlmResponse, SamplingParams};
use crate::types::{MuseError, Result, ToolDefinition};
use async_trait::async_trait;
use ollama_rs::generation::chat::{request::ChatMessageRequest, ChatMessage};
use ollama_rs::Ollama;

pub struct OllamaClient {
    client: Ollama,
    model: String,
    // Ollama applies server-side defaults; sampling params are kept for
    // parity with the other providers and future request options.
    #[allow(dead_code)]
    params: SamplingParams,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, params: SamplingParams) -> Self {
        let url_parts: Vec<&str> = base_url.split("://").collect();
        let (host, port) = if url_parts.len() == 2 {
            let host_port: Vec<&str> = url_parts[1].split(':').collect();
            let host = format!("{}://{}", url_parts[0], host_port[0]);
            let port = if host_port.len() == 2 {
                host_port[1].parse().unwrap_or(11434)
            } else {
                11434
            };
            (host, port)
        } else {
            ("http://localhost".to_string(), 11434)
        };

        Self {
            client: Ollama::new(host, port),
            model,
            params,
        }
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| MuseError::Llm(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt.to_string())]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let chat_messages: Vec<ChatMessage> = messages
            .iter()
            .map(|(role, content)| match role.as_str() {
                "system" => ChatMessage::system(content.clone()),
                "assistant" => ChatMessage::assistant(content.clone()),
                _ => ChatMessage::user(content.clone()),
            })
            .collect();

        self.chat(chat_messages).await
    }

    async fn generate_with_tools(
        &self,
        messages: &[(String, String)],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        // Native tool calling needs model support (llama3.1+, mistral-nemo);
        // until then the agent loop treats every Ollama answer as final.
        let content = self.generate_with_history(messages).await?;

        Ok(LlmResponse {
            content,
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base_url_with_port() {
        let client = OllamaClient::new(
            "http://127.0.0.1:11434".to_string(),
            "llama3.2".to_string(),
            SamplingParams {
                temperature: 0.7,
                max_tokens: 512,
            },
        );
        assert_eq!(client.model_name(), "llama3.2");
    }
}
