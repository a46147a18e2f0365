//! Mock implementations for testing.
//!
//! A scripted LLM client and a factory that hands the same shared script to
//! every agent, so a whole pipeline run can be driven deterministically
//! without network access.

use async_trait::async_trait;
use muse::llm::{LlmClient, LlmFactory, LlmResponse};
use muse::types::{MuseError, Result, ToolCall, ToolDefinition};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a scripted final-text response.
pub fn final_text(text: &str) -> LlmResponse {
    LlmResponse {
        content: text.to_string(),
        tool_calls: vec![],
        finish_reason: "stop".to_string(),
    }
}

/// Build a scripted tool-call response.
pub fn tool_call(name: &str, arguments: serde_json::Value) -> LlmResponse {
    LlmResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: format!("call-{}", name),
            name: name.to_string(),
            arguments,
        }],
        finish_reason: "tool_calls".to_string(),
    }
}

#[derive(Default)]
struct MockState {
    script: Mutex<VecDeque<LlmResponse>>,
    planner_reply: Mutex<Option<String>>,
    planner_fails: bool,
    histories: Mutex<Vec<Vec<(String, String)>>>,
    tool_rounds: AtomicUsize,
    planner_calls: AtomicUsize,
}

/// Mock LLM client with a shared, consumable response script.
///
/// `generate_with_tools` pops the next scripted response; once the script
/// runs dry every further call answers "done". `generate_with_system` (the
/// planner path) returns the configured planner reply.
#[derive(Clone, Default)]
pub struct MockLlmClient {
    state: Arc<MockState>,
}

impl MockLlmClient {
    pub fn scripted(responses: impl IntoIterator<Item = LlmResponse>) -> Self {
        let client = Self::default();
        *client.state.script.lock().unwrap() = responses.into_iter().collect();
        client
    }

    pub fn with_planner_reply(self, reply: &str) -> Self {
        *self.state.planner_reply.lock().unwrap() = Some(reply.to_string());
        self
    }

    pub fn with_failing_planner(mut self) -> Self {
        // Arc is still unshared while building.
        Arc::get_mut(&mut self.state)
            .expect("configure the mock before cloning it")
            .planner_fails = true;
        self
    }

    /// Number of tool-loop turns served so far.
    pub fn tool_rounds(&self) -> usize {
        self.state.tool_rounds.load(Ordering::SeqCst)
    }

    /// Number of planner (system-prompt) calls served so far.
    pub fn planner_calls(&self) -> usize {
        self.state.planner_calls.load(Ordering::SeqCst)
    }

    /// Every transcript passed to `generate_with_tools`, in call order.
    pub fn histories(&self) -> Vec<Vec<(String, String)>> {
        self.state.histories.lock().unwrap().clone()
    }

    fn next_response(&self) -> LlmResponse {
        self.state
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| final_text("done"))
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.next_response().content)
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.state.planner_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.planner_fails {
            return Err(MuseError::Llm("mock planner failure".to_string()));
        }
        Ok(self
            .state
            .planner_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "no plan".to_string()))
    }

    async fn generate_with_history(&self, _messages: &[(String, String)]) -> Result<String> {
        Ok(self.next_response().content)
    }

    async fn generate_with_tools(
        &self,
        messages: &[(String, String)],
        _tools: &[ToolDefinition],
    ) -> Result<LlmResponse> {
        self.state.tool_rounds.fetch_add(1, Ordering::SeqCst);
        self.state
            .histories
            .lock()
            .unwrap()
            .push(messages.to_vec());
        Ok(self.next_response())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Factory that hands every agent the same shared mock client.
pub struct MockLlmFactory {
    client: MockLlmClient,
}

impl MockLlmFactory {
    pub fn new(client: MockLlmClient) -> Self {
        Self { client }
    }

    pub fn into_arc(self) -> Arc<dyn LlmFactory> {
        Arc::new(self)
    }
}

#[async_trait]
impl LlmFactory for MockLlmFactory {
    async fn client_for_model(&self, _model: &str) -> Result<Arc<dyn LlmClient>> {
        Ok(Arc::new(self.client.clone()))
    }
}

