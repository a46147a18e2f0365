//! The configurable role agent and its reason-act loop

use crate::agents::race_cancellation;
use crate::agents::registry::AgentRegistry;
use crate::llm::{with_retry, LlmClient, RateLimiter, RetryPolicy};
use crate::tools::ToolRegistry;
use crate::types::{MuseError, Result, ToolCall, ToolDefinition};
use crate::utils::toml_config::AgentConfig;
use async_trait::async_trait;
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Name of the synthetic tool offered to delegation-enabled agents.
pub const DELEGATE_TOOL: &str = "delegate_work";

/// A named persona bound to an LLM, a tool allow-list, and behavioral flags.
///
/// `run` drives a reason-act loop bounded by the agent's iteration budget:
/// each turn acquires the pipeline-wide and per-agent rate-limit permits,
/// calls the model (with bounded retry), executes any requested tool calls,
/// and folds their results back into the transcript. Recoverable tool
/// failures become observations the model can route around; everything else
/// aborts the loop.
pub struct RoleAgent {
    name: String,
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    own_limiter: Option<Arc<RateLimiter>>,
    global_limiter: Option<Arc<RateLimiter>>,
    retry: RetryPolicy,
    registry: Arc<AgentRegistry>,
    max_delegation_depth: usize,
}

impl RoleAgent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        config: AgentConfig,
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        own_limiter: Option<Arc<RateLimiter>>,
        global_limiter: Option<Arc<RateLimiter>>,
        retry: RetryPolicy,
        registry: Arc<AgentRegistry>,
        max_delegation_depth: usize,
    ) -> Self {
        Self {
            name,
            config,
            llm,
            tools,
            own_limiter,
            global_limiter,
            retry,
            registry,
            max_delegation_depth,
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Run the agent against a fully rendered task prompt.
    pub async fn run(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        self.run_at_depth(prompt.to_string(), cancel.clone(), 0)
            .await
    }

    /// The loop itself. Delegation re-enters this function on a co-agent,
    /// so it returns a boxed future.
    fn run_at_depth(
        &self,
        prompt: String,
        cancel: CancellationToken,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            let mut transcript: Vec<(String, String)> = vec![
                ("system".to_string(), self.system_prompt()),
                ("user".to_string(), prompt),
            ];
            let tools = self.tool_definitions(depth);

            for iteration in 0..self.config.max_iterations {
                // Every attempt is an LLM call, so the permits are taken
                // inside the retried operation; cancellation is raced over
                // the whole composite, limiter waits included.
                let response = {
                    let agent = &*self;
                    let turn: &[(String, String)] = &transcript;
                    let tools: &[ToolDefinition] = &tools;
                    race_cancellation(
                        &cancel,
                        with_retry(self.retry, move || async move {
                            agent.acquire_permits().await;
                            agent.llm.generate_with_tools(turn, tools).await
                        }),
                    )
                    .await?
                };

                debug!(
                    agent = %self.name,
                    iteration,
                    tool_calls = response.tool_calls.len(),
                    finish_reason = %response.finish_reason,
                    "agent turn"
                );

                if response.tool_calls.is_empty() {
                    let content = response.content.trim();
                    if !content.is_empty() {
                        return Ok(content.to_string());
                    }
                    transcript.push((
                        "user".to_string(),
                        "Reply with your final answer.".to_string(),
                    ));
                    continue;
                }

                let assistant_turn = if response.content.trim().is_empty() {
                    let calls: Vec<String> = response
                        .tool_calls
                        .iter()
                        .map(|c| format!("{}({})", c.name, c.arguments))
                        .collect();
                    format!("[invoking: {}]", calls.join(", "))
                } else {
                    response.content.clone()
                };
                transcript.push(("assistant".to_string(), assistant_turn));

                for call in &response.tool_calls {
                    match self.dispatch_tool_call(call, &cancel, depth).await {
                        Ok(value) => transcript.push((
                            "user".to_string(),
                            format!("Tool '{}' returned: {}", call.name, value),
                        )),
                        Err(error) if error.is_recoverable_in_loop() => {
                            warn!(agent = %self.name, tool = %call.name, %error, "tool call failed");
                            transcript.push((
                                "user".to_string(),
                                format!(
                                    "Tool '{}' failed: {}. Adjust your approach.",
                                    call.name, error
                                ),
                            ));
                        }
                        Err(error) => return Err(error),
                    }
                }
            }

            Err(MuseError::AgentIncomplete {
                agent: self.name.clone(),
                iterations: self.config.max_iterations,
            })
        })
    }

    async fn dispatch_tool_call(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        depth: usize,
    ) -> Result<serde_json::Value> {
        if call.name == DELEGATE_TOOL {
            return self.delegate(call, cancel, depth).await;
        }

        if !self.config.tools.iter().any(|t| t == &call.name) {
            return Err(MuseError::Tool(format!(
                "tool '{}' is not available to this agent",
                call.name
            )));
        }

        race_cancellation(cancel, self.tools.execute(&call.name, call.arguments.clone())).await
    }

    async fn delegate(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
        depth: usize,
    ) -> Result<serde_json::Value> {
        if depth >= self.max_delegation_depth {
            return Err(MuseError::Tool(
                "delegation depth exhausted; answer directly".to_string(),
            ));
        }

        let coworker = call
            .arguments
            .get("coworker")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuseError::Tool("'coworker' is required".to_string()))?;
        let question = call
            .arguments
            .get("question")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MuseError::Tool("'question' is required".to_string()))?;

        if coworker == self.name {
            return Err(MuseError::Tool(
                "an agent cannot delegate to itself".to_string(),
            ));
        }

        let agent = self
            .registry
            .clone()
            .create_agent(coworker)
            .await
            .map_err(|e| MuseError::Tool(format!("cannot delegate to '{}': {}", coworker, e)))?;

        debug!(from = %self.name, to = %coworker, "delegating sub-question");

        match agent
            .run_at_depth(question.to_string(), cancel.clone(), depth + 1)
            .await
        {
            Ok(answer) => Ok(json!({ "coworker": coworker, "answer": answer })),
            // The coworker running dry is the delegator's problem to route
            // around, not a pipeline failure.
            Err(MuseError::AgentIncomplete { .. }) => Err(MuseError::Tool(format!(
                "coworker '{}' could not finish the sub-question",
                coworker
            ))),
            Err(other) => Err(other),
        }
    }

    /// Take the pipeline-wide permit first, then this agent's own; the
    /// effective ceiling is the minimum of the two.
    async fn acquire_permits(&self) {
        if let Some(global) = &self.global_limiter {
            global.acquire().await;
        }
        if let Some(own) = &self.own_limiter {
            own.acquire().await;
        }
    }

    fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}.\n\nGoal: {}\n\nBackground: {}",
            self.config.role, self.config.goal, self.config.backstory
        );

        if self.config.inject_date {
            prompt.push_str(&format!(
                "\n\nCurrent date: {}",
                chrono::Local::now().format("%Y-%m-%d")
            ));
        }

        if self.config.reasoning {
            prompt.push_str(
                "\n\nBefore answering, think through a short plan and check it against your goal.",
            );
        }

        if !self.config.tools.is_empty() {
            prompt.push_str(
                "\n\nUse the available tools when you need current information or file access.",
            );
        }

        prompt
    }

    fn tool_definitions(&self, depth: usize) -> Vec<ToolDefinition> {
        let mut definitions = self.tools.get_tool_definitions_for(&self.config.tools);

        if self.config.allow_delegation && depth < self.max_delegation_depth {
            let roster = self.registry.roster_summary(&self.name);
            if !roster.is_empty() {
                definitions.push(ToolDefinition {
                    name: DELEGATE_TOOL.to_string(),
                    description: format!(
                        "Delegate a self-contained sub-question to a coworker. Available coworkers: {}",
                        roster
                    ),
                    parameters: json!({
                        "type": "object",
                        "properties": {
                            "coworker": {
                                "type": "string",
                                "description": "Name of the coworker to ask"
                            },
                            "question": {
                                "type": "string",
                                "description": "The sub-question, with all context the coworker needs"
                            }
                        },
                        "required": ["coworker", "question"]
                    }),
                });
            }
        }

        definitions
    }
}

#[async_trait]
impl super::Agent for RoleAgent {
    async fn execute(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        self.run(prompt, cancel).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> &str {
        &self.config.role
    }
}
