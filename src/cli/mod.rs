//! Command-line interface for the pipeline runner

pub mod init;
pub mod output;

use crate::cli::output::Output;
use anyhow::Context;
use clap::{Parser, Subcommand};
use muse::llm::ProviderRegistry;
use muse::pipeline::context::ExecutionContext;
use muse::pipeline::Crew;
use muse::tools::ToolRegistry;
use muse::types::RunStatus;
use muse::utils::toml_config::MuseConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "muse-runner",
    version,
    about = "M.U.S.E - sequential multi-agent pipeline runner"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute the configured pipeline
    Run {
        /// Path to the root configuration file
        #[arg(short, long, default_value = "muse.toml")]
        config: PathBuf,

        /// Execution input as key=value; repeat for each input
        #[arg(short, long = "input", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,

        /// Skip the planning pass even if the config enables it
        #[arg(long)]
        no_planning: bool,

        /// Override the drafts directory from the config
        #[arg(long)]
        drafts_dir: Option<PathBuf>,
    },

    /// Load the configuration and print the agent and task catalogs
    Validate {
        /// Path to the root configuration file
        #[arg(short, long, default_value = "muse.toml")]
        config: PathBuf,
    },

    /// Scaffold a starter configuration in a directory
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

pub async fn run_command(
    config_path: PathBuf,
    inputs: Vec<(String, String)>,
    no_planning: bool,
    drafts_dir: Option<PathBuf>,
    out: &Output,
) -> anyhow::Result<()> {
    let mut config = MuseConfig::load(&config_path)
        .with_context(|| format!("loading '{}'", config_path.display()))?;
    if no_planning {
        config.pipeline.planning = false;
    }
    if let Some(dir) = drafts_dir {
        config.pipeline.drafts_dir = dir;
    }

    out.banner();
    out.info(&format!(
        "pipeline '{}': {} agents, {} tasks",
        config.pipeline.name,
        config.agents.len(),
        config.tasks.len()
    ));

    let provider_registry = Arc::new(ProviderRegistry::from_config(&config));
    let tool_registry = Arc::new(ToolRegistry::with_pipeline_tools(
        &config.pipeline.drafts_dir,
    ));
    let drafts_dir = config.pipeline.drafts_dir.clone();
    let crew = Crew::from_config(config, provider_registry, tool_registry)?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; finishing at the next suspension point");
            signal_cancel.cancel();
        }
    });

    let context = ExecutionContext::from_pairs(inputs);
    let result = crew.kickoff(context, cancel).await?;

    out.heading("Tasks");
    for task in &result.task_results {
        match task.status {
            muse::types::TaskStatus::Completed => out.success(&format!(
                "{} ({}) in {} ms",
                task.task, task.agent, task.duration_ms
            )),
            muse::types::TaskStatus::Failed => out.error(&format!(
                "{}: {}",
                task.task,
                task.error.as_deref().unwrap_or("failed")
            )),
            muse::types::TaskStatus::Skipped => out.warning(&format!("{}: skipped", task.task)),
        }
    }

    match result.status {
        RunStatus::Completed => {
            out.success(&format!(
                "run {} completed; drafts in '{}'",
                result.run_id,
                drafts_dir.display()
            ));
            Ok(())
        }
        RunStatus::Cancelled => {
            out.warning(&format!(
                "run {} cancelled after {} task(s)",
                result.run_id,
                result.completed_count()
            ));
            anyhow::bail!("run cancelled")
        }
        RunStatus::Failed => {
            let error = result.error.unwrap_or_else(|| "unknown error".to_string());
            out.error(&format!("run {} failed: {}", result.run_id, error));
            anyhow::bail!("run failed: {}", error)
        }
    }
}

pub fn validate_command(config_path: PathBuf, out: &Output) -> anyhow::Result<()> {
    let config = MuseConfig::load(&config_path)
        .with_context(|| format!("loading '{}'", config_path.display()))?;

    out.heading("Agents");
    let mut names: Vec<_> = config.agents.keys().collect();
    names.sort();
    for name in names {
        let agent = &config.agents[name];
        out.info(&format!(
            "{} - {} (model: {}, tools: {})",
            name,
            agent.role,
            agent.model,
            if agent.tools.is_empty() {
                "none".to_string()
            } else {
                agent.tools.join(", ")
            }
        ));
    }

    out.heading("Tasks (execution order)");
    for (i, task) in config.tasks.iter().enumerate() {
        let schema = match task.output_schema {
            Some(_) => ", schema-validated",
            None => "",
        };
        out.info(&format!(
            "{}. {} -> {}{}",
            i + 1,
            task.name,
            task.agent,
            schema
        ));
    }

    out.success("configuration is valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_inputs() {
        assert_eq!(
            parse_key_val("product_name=Study Coach").unwrap(),
            ("product_name".to_string(), "Study Coach".to_string())
        );
        assert_eq!(
            parse_key_val("budget=Rs. 50,000=ish").unwrap().1,
            "Rs. 50,000=ish"
        );
        assert!(parse_key_val("no-equals").is_err());
        assert!(parse_key_val("=value").is_err());
    }
}
