//! LLM client abstractions and provider management
//!
//! Every provider sits behind the [`LlmClient`] trait so the rest of the
//! crate never talks to a vendor API directly. Providers:
//! - **Gemini**: always compiled, plain reqwest client
//! - **Ollama**: local inference, `ollama` feature (default)
//! - **OpenAI**: OpenAI and compatible endpoints, `openai` feature

pub mod client;
pub mod gemini;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;
pub mod rate_limit;
pub mod retry;

pub use client::{LlmClient, LlmFactory, LlmResponse, Provider, ProviderRegistry, SamplingParams};
pub use rate_limit::RateLimiter;
pub use retry::{with_retry, RetryPolicy};
