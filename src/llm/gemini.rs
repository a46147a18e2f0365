//! Google Gemini client (API-key mode)
//!
//! Talks to the `generateContent` endpoint of the Google AI Studio API.
//! System prompts map to `systemInstruction`, assistant turns to the
//! `model` role, and tool definitions to `functionDeclarations`.

use crate::llm::client::{LlmClient, LlmResponse, SamplingParams};
use crate::types::{MuseError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    params: SamplingParams,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model: String, params: SamplingParams) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
            params,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    async fn request(&self, body: GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .http
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| MuseError::Llm(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MuseError::Llm(format!(
                "Gemini returned {}: {}",
                status, detail
            )));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| MuseError::Llm(format!("Gemini response parse error: {}", e)))
    }

    fn build_request(
        &self,
        messages: &[(String, String)],
        tools: &[ToolDefinition],
    ) -> GenerateRequest {
        let mut system_parts: Vec<Part> = Vec::new();
        let mut contents: Vec<Content> = Vec::new();

        for (role, text) in messages {
            match role.as_str() {
                "system" => system_parts.push(Part::text(text)),
                "assistant" => contents.push(Content::new("model", text)),
                _ => contents.push(Content::new("user", text)),
            }
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(SystemInstruction {
                parts: system_parts,
            })
        };

        let tools = if tools.is_empty() {
            None
        } else {
            Some(vec![ToolBlock {
                function_declarations: tools
                    .iter()
                    .map(|t| FunctionDeclaration {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    })
                    .collect(),
            }])
        };

        GenerateRequest {
            contents,
            system_instruction,
            tools,
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_history(&[("user".to_string(), prompt.to_string())])
            .await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_with_history(&[
            ("system".to_string(), system.to_string()),
            ("user".to_string(), prompt.to_string()),
        ])
        .await
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let body = self.build_request(messages, &[]);
        let response = self.request(body).await?;
        let (text, _, _) = response.into_parts();
        if text.is_empty() {
            return Err(MuseError::Llm("Gemini returned no text".to_string()));
        }
        Ok(text)
    }

    async fn generate_with_tools(
        &self,
        messages: &[(String, String)],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        let body = self.build_request(messages, tools);
        let response = self.request(body).await?;
        let (content, tool_calls, finish_reason) = response.into_parts();
        Ok(LlmResponse {
            content,
            tool_calls,
            finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Wire Types =============

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolBlock>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ToolBlock {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "functionCall", default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

impl GenerateResponse {
    /// Flatten the first candidate into (text, tool calls, finish reason).
    fn into_parts(self) -> (String, Vec<ToolCall>, String) {
        let mut text = String::new();
        let mut tool_calls = Vec::new();
        let mut finish_reason = "stop".to_string();

        if let Some(candidate) = self.candidates.into_iter().next() {
            if let Some(reason) = candidate.finish_reason {
                finish_reason = reason.to_lowercase();
            }
            if let Some(content) = candidate.content {
                for (i, part) in content.parts.into_iter().enumerate() {
                    if let Some(t) = part.text {
                        text.push_str(&t);
                    }
                    if let Some(call) = part.function_call {
                        tool_calls.push(ToolCall {
                            id: format!("call-{}", i),
                            name: call.name,
                            arguments: call.args,
                        });
                    }
                }
            }
        }

        if !tool_calls.is_empty() {
            finish_reason = "tool_calls".to_string();
        }

        (text, tool_calls, finish_reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_flattens_text_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Hello"}, {"text": " world"}]},
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        let (text, calls, reason) = response.into_parts();
        assert_eq!(text, "Hello world");
        assert!(calls.is_empty());
        assert_eq!(reason, "stop");
    }

    #[test]
    fn response_extracts_function_calls() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [
                    {"functionCall": {"name": "web_search", "args": {"query": "rust"}}}
                ]}
            }]
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        let (_, calls, reason) = response.into_parts();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "web_search");
        assert_eq!(calls[0].arguments["query"], "rust");
        assert_eq!(reason, "tool_calls");
    }

    #[test]
    fn empty_response_yields_empty_text() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        let (text, calls, _) = response.into_parts();
        assert!(text.is_empty());
        assert!(calls.is_empty());
    }
}
