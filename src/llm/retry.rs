//! Bounded exponential backoff for transient LLM failures
//!
//! Only `MuseError::Llm` is considered transient. After the attempt budget
//! is spent the last transient error escalates to `LlmUnavailable`; every
//! other error kind passes through untouched on the first occurrence.

use crate::types::{MuseError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Run `op` until it succeeds, a non-transient error occurs, or the attempt
/// budget is exhausted.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.base_delay;
    let mut last_error = String::new();

    for attempt in 1..=policy.max_attempts.max(1) {
        match op().await {
            Ok(value) => return Ok(value),
            Err(MuseError::Llm(message)) => {
                warn!(attempt, %message, "transient LLM failure");
                last_error = message;
                if attempt < policy.max_attempts {
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(policy.max_delay);
                }
            }
            Err(other) => return Err(other),
        }
    }

    Err(MuseError::LlmUnavailable(last_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn succeeds_within_budget() {
        let calls = AtomicU32::new(0);
        let result = with_retry(RetryPolicy::default(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(MuseError::Llm("timeout".to_string()))
                } else {
                    Ok("answer".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn escalates_to_unavailable_after_budget() {
        let result: Result<String> = with_retry(RetryPolicy::default(), || async {
            Err(MuseError::Llm("quota".to_string()))
        })
        .await;

        match result {
            Err(MuseError::LlmUnavailable(msg)) => assert_eq!(msg, "quota"),
            other => panic!("expected LlmUnavailable, got {:?}", other.err()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_pass_through() {
        let calls = AtomicU32::new(0);
        let result: Result<String> = with_retry(RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(MuseError::Validation("bad".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(MuseError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
