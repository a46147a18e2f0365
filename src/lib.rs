//! # M.U.S.E - Multi-agent Unified Sequential Executor
//!
//! A config-driven pipeline runner for role-based LLM agents. Named
//! personas with scoped tool access execute an ordered task list; outputs
//! flow into later tasks, schema-declared results are validated fail-closed,
//! and every LLM call passes a rolling-window rate limiter and a bounded
//! retry policy.
//!
//! ## Overview
//!
//! M.U.S.E can be used in two ways:
//!
//! 1. **As a CLI** - run the `muse-runner` binary against a `muse.toml`
//! 2. **As a library** - wire [`Crew`] into your own Rust project
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use muse::llm::ProviderRegistry;
//! use muse::pipeline::context::ExecutionContext;
//! use muse::pipeline::Crew;
//! use muse::tools::ToolRegistry;
//! use muse::utils::toml_config::MuseConfig;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MuseConfig::load("muse.toml")?;
//!     let providers = Arc::new(ProviderRegistry::from_config(&config));
//!     let tools = Arc::new(ToolRegistry::with_pipeline_tools(
//!         &config.pipeline.drafts_dir,
//!     ));
//!
//!     let crew = Crew::from_config(config, providers, tools)?;
//!     let inputs = ExecutionContext::from_pairs([
//!         ("product_name", "Personal AI Study Coach"),
//!         ("target_audience", "universities and colleges"),
//!         ("product_description", "An AI tutor that adapts to each student"),
//!         ("budget", "Rs. 50,000"),
//!     ]);
//!
//!     let result = crew.kickoff(inputs, CancellationToken::new()).await?;
//!     println!("{} tasks completed", result.completed_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `openai` | OpenAI API and compatible endpoints |
//!
//! The Gemini provider is always compiled.
//!
//! ## Modules
//!
//! - [`agents`] - role agents and the agent registry
//! - [`llm`] - provider clients, retry, and rate limiting
//! - [`output`] - structured-output validation and draft persistence
//! - [`pipeline`] - the crew orchestrator, execution context, planner
//! - [`tools`] - tool trait, registry, and built-in tools
//! - [`types`] - common types and error handling
//! - [`utils`] - TOML configuration

/// Role agents and the agent registry.
pub mod agents;
/// LLM provider clients and abstractions.
pub mod llm;
/// Structured output validation and draft persistence.
pub mod output;
/// Pipeline orchestration: crew, context, planner.
pub mod pipeline;
/// Built-in tools and the tool registry.
pub mod tools;
/// Core types (records, results, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use agents::{Agent, AgentRegistry, RoleAgent};
pub use llm::{LlmClient, LlmFactory, LlmResponse, Provider, ProviderRegistry, RateLimiter};
pub use output::{DraftStore, validate_content};
pub use pipeline::context::ExecutionContext;
pub use pipeline::{Crew, RunState};
pub use tools::{Tool, ToolRegistry};
pub use types::{ContentRecord, MuseError, Result, RunResult, RunStatus, TaskResult, TaskStatus};
pub use utils::toml_config::{MuseConfig, PipelineConfig};
