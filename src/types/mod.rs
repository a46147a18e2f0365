use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Structured Output Types =============

/// Schema-validated content artifact produced by tasks that declare an
/// output schema. All fields are required; unknown fields fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContentRecord {
    /// The kind of content (e.g. blog post, social media post, reel script)
    pub content_type: String,
    /// The topic the content covers
    pub topic: String,
    /// The audience the content is written for
    pub target_audience: String,
    /// Tags attached to the content
    pub tags: Vec<String>,
    /// The content body itself
    pub content: String,
}

// ============= Run Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Failed,
    Skipped,
}

/// Outcome of a single task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task name as declared in the catalog
    pub task: String,
    /// Name of the agent that executed the task
    pub agent: String,
    /// Raw text returned by the agent
    pub raw: String,
    /// Validated record, present when the task declared an output schema
    pub record: Option<ContentRecord>,
    pub status: TaskStatus,
    /// Error message when status is Failed
    pub error: Option<String>,
    pub duration_ms: u64,
    /// Path of the persisted draft artifact, when one was written
    pub artifact: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
    Cancelled,
}

/// Aggregate result of a pipeline run. Task results appear in declaration
/// order; a Failed run carries the results of every task that finished
/// before the failing one, plus the failing task itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub task_results: Vec<TaskResult>,
    /// The first failing task's error when status is Failed
    pub error: Option<String>,
}

impl RunResult {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Number of tasks that finished successfully.
    pub fn completed_count(&self) -> usize {
        self.task_results
            .iter()
            .filter(|r| r.status == TaskStatus::Completed)
            .count()
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum MuseError {
    /// Bad or missing configuration, unresolved references. Fatal at load
    /// time; nothing runs after this.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file tool tried to reach outside its scoped root.
    #[error("Permission denied: '{path}' is outside the tool root '{root}'")]
    PermissionDenied { path: PathBuf, root: PathBuf },

    /// The agent ran out of iterations before producing a final answer.
    #[error("Agent '{agent}' exhausted its iteration budget ({iterations})")]
    AgentIncomplete { agent: String, iterations: usize },

    /// Structured output did not match the declared schema.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transient LLM failure. Retried with backoff before escalating.
    #[error("LLM error: {0}")]
    Llm(String),

    /// LLM still failing after the retry budget was spent.
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// A tool call failed. Surfaced into the agent's reasoning loop as a
    /// recoverable observation.
    #[error("Tool error: {0}")]
    Tool(String),

    /// The run was cancelled before or during this operation.
    #[error("Run cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MuseError {
    /// Whether the agent loop may keep going after seeing this error from a
    /// tool call. Permission and tool failures are observations the model
    /// can route around; everything else aborts the loop.
    pub fn is_recoverable_in_loop(&self) -> bool {
        matches!(
            self,
            MuseError::PermissionDenied { .. } | MuseError::Tool(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MuseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_record_round_trips_through_json() {
        let record = ContentRecord {
            content_type: "blog post".to_string(),
            topic: "AI tutoring".to_string(),
            target_audience: "universities".to_string(),
            tags: vec!["ai".to_string(), "education".to_string()],
            content: "Draft body".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: ContentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn content_record_rejects_unknown_fields() {
        let json = r#"{
            "content_type": "blog post",
            "topic": "t",
            "target_audience": "a",
            "tags": [],
            "content": "c",
            "extra": true
        }"#;
        assert!(serde_json::from_str::<ContentRecord>(json).is_err());
    }

    #[test]
    fn permission_denied_names_both_paths() {
        let err = MuseError::PermissionDenied {
            path: PathBuf::from("/etc/passwd"),
            root: PathBuf::from("/tmp/drafts"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/passwd"));
        assert!(msg.contains("/tmp/drafts"));
        assert!(err.is_recoverable_in_loop());
    }

    #[test]
    fn run_result_counts_completed_tasks() {
        let result = RunResult {
            run_id: Uuid::new_v4(),
            status: RunStatus::Failed,
            task_results: vec![
                TaskResult {
                    task: "t1".to_string(),
                    agent: "a".to_string(),
                    raw: "ok".to_string(),
                    record: None,
                    status: TaskStatus::Completed,
                    error: None,
                    duration_ms: 10,
                    artifact: None,
                },
                TaskResult {
                    task: "t2".to_string(),
                    agent: "a".to_string(),
                    raw: String::new(),
                    record: None,
                    status: TaskStatus::Failed,
                    error: Some("boom".to_string()),
                    duration_ms: 5,
                    artifact: None,
                },
            ],
            error: Some("boom".to_string()),
        };

        assert!(!result.is_completed());
        assert_eq!(result.completed_count(), 1);
    }
}
