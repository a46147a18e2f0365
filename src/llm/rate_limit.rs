//! Rolling-window request limiter
//!
//! Callers `acquire` a permit before every LLM call. At most `max` permits
//! are handed out per rolling window; an over-budget caller suspends until
//! the oldest permit in the window expires, it is never rejected. Both the
//! pipeline-wide ceiling and each agent's own ceiling are instances of this
//! type; acquiring both makes the effective limit their minimum.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateLimiter {
    max: usize,
    window: Duration,
    stamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// A limiter over the standard 60-second rolling window.
    pub fn per_minute(max: u32) -> Self {
        Self::new(max, Duration::from_secs(60))
    }

    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            // A zero ceiling would never admit anyone; clamp to one.
            max: max.max(1) as usize,
            window,
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Take a permit, suspending until the rolling window admits one.
    pub async fn acquire(&self) {
        loop {
            let wait_until = {
                let mut stamps = self.stamps.lock().await;
                let now = Instant::now();
                while stamps
                    .front()
                    .is_some_and(|t| now.duration_since(*t) >= self.window)
                {
                    stamps.pop_front();
                }

                if stamps.len() < self.max {
                    stamps.push_back(now);
                    return;
                }

                match stamps.front() {
                    Some(oldest) => *oldest + self.window,
                    None => now,
                }
            };

            tokio::time::sleep_until(wait_until).await;
        }
    }
}
