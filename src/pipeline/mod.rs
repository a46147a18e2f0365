//! Pipeline orchestration
//!
//! [`Crew`] owns the agent registry and the ordered task list and drives a
//! run through its state machine: Pending, an optional Planning pass,
//! Executing, and one terminal state (Completed, Failed, or Cancelled).
//! Tasks execute strictly in declaration order; each task's output becomes
//! available to later tasks' templates and context blocks. A task failure
//! fails the run unless continue-on-error is configured; cancellation
//! prevents any further task from starting and aborts the in-flight task at
//! its next suspension point.

pub mod context;
pub mod planner;

use crate::agents::AgentRegistry;
use crate::llm::{LlmFactory, RetryPolicy};
use crate::output::{schema_instructions, validate_content, DraftStore};
use crate::pipeline::context::{interpolate, ExecutionContext};
use crate::pipeline::planner::Planner;
use crate::tools::ToolRegistry;
use crate::types::{
    ContentRecord, MuseError, Result, RunResult, RunStatus, TaskResult, TaskStatus,
};
use crate::utils::toml_config::{MuseConfig, OutputSchemaKind, PipelineConfig, TaskConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Lifecycle of a run. Terminal states are final; a crew runs once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Planning,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Cancelled
        )
    }
}

pub struct Crew {
    settings: PipelineConfig,
    agents: Arc<AgentRegistry>,
    tasks: Vec<TaskConfig>,
    llm_factory: Arc<dyn LlmFactory>,
    drafts: DraftStore,
    state: parking_lot::Mutex<RunState>,
}

impl Crew {
    /// Build a crew from a validated configuration. Re-validates so that
    /// programmatically assembled configs get the same reference checks as
    /// loaded ones; no dangling task-to-agent reference survives this call.
    pub fn from_config(
        config: MuseConfig,
        llm_factory: Arc<dyn LlmFactory>,
        tool_registry: Arc<ToolRegistry>,
    ) -> Result<Self> {
        config.validate()?;

        let agents = Arc::new(AgentRegistry::from_config(
            &config,
            Arc::clone(&llm_factory),
            tool_registry,
        ));
        let drafts = DraftStore::new(&config.pipeline.drafts_dir);

        Ok(Self {
            settings: config.pipeline,
            agents,
            tasks: config.tasks,
            llm_factory,
            drafts,
            state: parking_lot::Mutex::new(RunState::Pending),
        })
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name.clone()).collect()
    }

    pub fn agent_registry(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    fn set_state(&self, next: RunState) {
        *self.state.lock() = next;
    }

    /// Execute the pipeline. Consumes the Pending state; a second kickoff
    /// on the same crew is an error.
    pub async fn kickoff(
        &self,
        mut inputs: ExecutionContext,
        cancel: CancellationToken,
    ) -> Result<RunResult> {
        {
            let mut state = self.state.lock();
            if *state != RunState::Pending {
                return Err(MuseError::Internal(
                    "kickoff may only be called once per crew".to_string(),
                ));
            }
            *state = RunState::Executing;
        }

        inputs.ensure_current_date();
        self.drafts.prepare().await?;

        let run_id = Uuid::new_v4();
        info!(%run_id, pipeline = %self.settings.name, tasks = self.tasks.len(), "kickoff");

        let annotations = if self.settings.planning && !cancel.is_cancelled() {
            self.set_state(RunState::Planning);
            let annotations = self.run_planning(&cancel).await;
            self.set_state(RunState::Executing);
            annotations
        } else {
            HashMap::new()
        };

        let mut results: Vec<TaskResult> = Vec::new();
        let mut outputs: HashMap<String, String> = HashMap::new();
        let mut first_error: Option<String> = None;

        for (position, task) in self.tasks.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(task = %task.name, "cancelled before task start");
                self.set_state(RunState::Cancelled);
                return Ok(RunResult {
                    run_id,
                    status: RunStatus::Cancelled,
                    task_results: results,
                    error: None,
                });
            }

            let started = Instant::now();
            info!(task = %task.name, agent = %task.agent, position, "task start");

            match self
                .execute_task(position, task, &inputs, &outputs, &annotations, &cancel)
                .await
            {
                Ok((raw, record, artifact)) => {
                    outputs.insert(task.name.clone(), raw.clone());
                    results.push(TaskResult {
                        task: task.name.clone(),
                        agent: task.agent.clone(),
                        raw,
                        record,
                        status: TaskStatus::Completed,
                        error: None,
                        duration_ms: started.elapsed().as_millis() as u64,
                        artifact,
                    });
                    info!(task = %task.name, "task completed");
                }
                Err(MuseError::Cancelled) => {
                    // The in-flight task stopped at a suspension point; it
                    // is never reported as successful.
                    info!(task = %task.name, "cancelled mid-task");
                    self.set_state(RunState::Cancelled);
                    return Ok(RunResult {
                        run_id,
                        status: RunStatus::Cancelled,
                        task_results: results,
                        error: None,
                    });
                }
                Err(err) => {
                    let message = err.to_string();
                    error!(task = %task.name, error = %message, "task failed");
                    results.push(TaskResult {
                        task: task.name.clone(),
                        agent: task.agent.clone(),
                        raw: String::new(),
                        record: None,
                        status: TaskStatus::Failed,
                        error: Some(message.clone()),
                        duration_ms: started.elapsed().as_millis() as u64,
                        artifact: None,
                    });
                    if first_error.is_none() {
                        first_error = Some(message);
                    }
                    if !self.settings.continue_on_error {
                        break;
                    }
                }
            }
        }

        let result = match first_error {
            Some(error) => {
                self.set_state(RunState::Failed);
                RunResult {
                    run_id,
                    status: RunStatus::Failed,
                    task_results: results,
                    error: Some(error),
                }
            }
            None => {
                self.set_state(RunState::Completed);
                RunResult {
                    run_id,
                    status: RunStatus::Completed,
                    task_results: results,
                    error: None,
                }
            }
        };

        info!(%run_id, status = ?result.status, completed = result.completed_count(), "run finished");
        Ok(result)
    }

    /// The planning pass never fails the run: any error short of
    /// cancellation is logged and swallowed.
    async fn run_planning(&self, cancel: &CancellationToken) -> HashMap<String, String> {
        let model = self
            .settings
            .planning_model
            .clone()
            .unwrap_or_else(|| "default".to_string());

        let llm = match self.llm_factory.client_for_model(&model).await {
            Ok(llm) => llm,
            Err(err) => {
                warn!(%err, "planning skipped: no client for planning model");
                return HashMap::new();
            }
        };

        let planner = Planner::new(llm, self.agents.global_limiter(), RetryPolicy::default());
        match planner.annotate(&self.tasks, &self.agents, cancel).await {
            Ok(annotations) => annotations,
            Err(err) => {
                warn!(%err, "planning failed; executing without a plan");
                HashMap::new()
            }
        }
    }

    async fn execute_task(
        &self,
        position: usize,
        task: &TaskConfig,
        inputs: &ExecutionContext,
        outputs: &HashMap<String, String>,
        annotations: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<(String, Option<ContentRecord>, Option<PathBuf>)> {
        let agent = self.agents.clone().create_agent(&task.agent).await?;
        let prompt = self.render_prompt(task, inputs, outputs, annotations)?;

        let raw = agent.run(&prompt, cancel).await?;

        let Some(OutputSchemaKind::Content) = task.output_schema else {
            let artifact = self.drafts.write_raw(position, &task.name, &raw).await?;
            return Ok((raw, None, Some(artifact)));
        };

        // Validation gates success: a schema task only completes once its
        // output parses, within the bounded re-prompt budget.
        let mut attempt = 0;
        let mut current = raw;
        loop {
            match validate_content(&current) {
                Ok(record) => {
                    let artifact = self
                        .drafts
                        .write_record(position, &task.name, &record)
                        .await?;
                    return Ok((current, Some(record), Some(artifact)));
                }
                Err(err @ MuseError::Validation(_)) if attempt < self.settings.schema_retries => {
                    attempt += 1;
                    warn!(task = %task.name, attempt, %err, "schema validation failed; re-prompting");
                    let reprompt = format!(
                        "{}\n\nYour previous answer failed validation: {}.\n{}",
                        prompt,
                        err,
                        schema_instructions()
                    );
                    current = agent.run(&reprompt, cancel).await?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn render_prompt(
        &self,
        task: &TaskConfig,
        inputs: &ExecutionContext,
        outputs: &HashMap<String, String>,
        annotations: &HashMap<String, String>,
    ) -> Result<String> {
        let mut prompt = interpolate(&task.description, inputs, outputs)?;
        let expected = interpolate(&task.expected_output, inputs, outputs)?;

        if !task.context.is_empty() {
            prompt.push_str("\n\nContext from earlier tasks:");
            for name in &task.context {
                // A context task may have failed under continue-on-error;
                // only completed outputs are attached.
                if let Some(output) = outputs.get(name) {
                    prompt.push_str(&format!("\n\n--- {} ---\n{}", name, output));
                }
            }
        }

        prompt.push_str(&format!("\n\nExpected output: {}", expected));

        if let Some(guidance) = annotations.get(&task.name) {
            prompt.push_str(&format!("\n\nPlanning guidance: {}", guidance));
        }

        if task.output_schema.is_some() {
            prompt.push_str("\n\n");
            prompt.push_str(&schema_instructions());
        }

        Ok(prompt)
    }
}
