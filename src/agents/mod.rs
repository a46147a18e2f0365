//! Role-based agents
//!
//! An agent is a configured persona (role, goal, backstory) bound to an LLM
//! client, an allow-listed subset of the tool registry, and behavioral
//! flags. [`RoleAgent`] runs the bounded reason-act loop; [`AgentRegistry`]
//! validates configuration and instantiates agents on demand.

pub mod registry;
pub mod role;

use crate::types::{MuseError, Result};
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

pub use registry::AgentRegistry;
pub use role::RoleAgent;

/// Base trait for agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Execute the agent against a fully rendered task prompt
    async fn execute(&self, prompt: &str, cancel: &CancellationToken) -> Result<String>;

    /// The agent's catalog name
    fn name(&self) -> &str;

    /// The agent's role description
    fn role(&self) -> &str;
}

/// Race a fallible future against the cancellation token. Used at every
/// suspension point so an in-flight task stops at the next await rather
/// than running to completion after cancellation. The poll order is biased
/// toward the work: a call that already finished keeps its result even if
/// the signal arrived while it ran, and the abort lands at the next
/// suspension point instead.
pub(crate) async fn race_cancellation<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        result = fut => result,
        _ = cancel.cancelled() => Err(MuseError::Cancelled),
    }
}
