//! Retry budget and backoff schedule for `--retry`.
//!
//! Waits start at 1/8 s and double while below one second, then grow by one
//! second per attempt, capped at `max_wait`:
//!
//! ```text
//! 0.125s  0.25s  0.5s  1s  2s  3s  ...  max_wait  max_wait  ...
//! ```

use crate::config::RetryConfig;
use std::time::Duration;

const INITIAL_WAIT: Duration = Duration::from_millis(125);
const UNIT: Duration = Duration::from_secs(1);

/// Attempt and time budget for one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts, including the first one
    pub max_tries: u32,
    /// Wall-clock budget across all attempts and waits
    pub max_time: Duration,
    /// Ceiling for a single wait
    pub max_wait: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_tries: config.max_tries.max(1),
            max_time: config.max_time(),
            max_wait: config.max_wait(),
        }
    }

    /// Whether `attempts` made over `elapsed` used up the budget, whichever
    /// ceiling is reached first.
    pub fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        attempts >= self.max_tries || elapsed >= self.max_time
    }

    /// Clamp a scheduled wait to the time left in the budget.
    pub fn clamp_wait(&self, wait: Duration, elapsed: Duration) -> Duration {
        wait.min(self.max_wait)
            .min(self.max_time.saturating_sub(elapsed))
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: INITIAL_WAIT,
            max_wait: self.max_wait,
        }
    }
}

/// Infinite schedule of waits between attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max_wait: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next.min(self.max_wait);
        self.next = if self.next < UNIT {
            self.next * 2
        } else {
            self.next.saturating_add(UNIT)
        };
        Some(current)
    }
}
