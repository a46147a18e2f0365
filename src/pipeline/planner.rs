//! Optional up-front planning pass
//!
//! One rate-limited, retried LLM call that reads the whole task list and
//! produces per-task guidance. The pass annotates instructions only; task
//! order is fixed at load time and never changes here. A failed pass is the
//! caller's to log and ignore, execution proceeds unplanned.

use crate::agents::race_cancellation;
use crate::agents::AgentRegistry;
use crate::llm::{with_retry, LlmClient, RateLimiter, RetryPolicy};
use crate::types::Result;
use crate::utils::toml_config::TaskConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const PLANNER_SYSTEM_PROMPT: &str = "You are the planning step of a sequential multi-agent \
pipeline. You will see the ordered task list and the agent assigned to each task. For every \
task, write one short line of concrete guidance the agent should follow. Output one line per \
task, formatted exactly as 'task_name: guidance'. Do not reorder, add, or remove tasks.";

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    limiter: Option<Arc<RateLimiter>>,
    retry: RetryPolicy,
}

impl Planner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        limiter: Option<Arc<RateLimiter>>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            llm,
            limiter,
            retry,
        }
    }

    /// Produce guidance keyed by task name. Tasks the model skipped are
    /// simply absent from the map.
    pub async fn annotate(
        &self,
        tasks: &[TaskConfig],
        agents: &AgentRegistry,
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, String>> {
        let listing = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| {
                let role = agents
                    .get_config(&task.agent)
                    .map(|a| a.role.as_str())
                    .unwrap_or(task.agent.as_str());
                format!("{}. {} (agent: {}) - {}", i + 1, task.name, role, task.description)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let planner = &*self;
        let listing_ref = listing.as_str();
        let response = race_cancellation(
            cancel,
            with_retry(self.retry, move || async move {
                if let Some(limiter) = &planner.limiter {
                    limiter.acquire().await;
                }
                planner
                    .llm
                    .generate_with_system(PLANNER_SYSTEM_PROMPT, listing_ref)
                    .await
            }),
        )
        .await?;

        let guidance = parse_guidance(&response, tasks);
        debug!(annotated = guidance.len(), total = tasks.len(), "planning pass done");
        Ok(guidance)
    }
}

/// Pull `task_name: guidance` lines out of the planner's reply, ignoring
/// anything that does not name a known task.
fn parse_guidance(response: &str, tasks: &[TaskConfig]) -> HashMap<String, String> {
    let mut guidance = HashMap::new();
    for line in response.lines() {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let name = name
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ')
            .trim_matches(|c| c == '*' || c == '-' || c == ' ');
        let rest = rest.trim();
        if rest.is_empty() {
            continue;
        }
        if tasks.iter().any(|t| t.name == name) {
            guidance.insert(name.to_string(), rest.to_string());
        }
    }
    guidance
}
