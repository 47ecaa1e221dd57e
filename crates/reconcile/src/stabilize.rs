//! Bounded, fixed-delay retry policy for resources that are not ready yet
//!
//! Pure data: the policy decides whether another attempt is allowed and what
//! the next counter is. Waiting and re-invoking is the caller's job.

use crate::context::CallbackContext;
use std::time::Duration;

/// Default delay between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

/// Default total time allowed for a resource to stabilize.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(25 * 60);

/// Retry policy for "not yet ready" conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizationPolicy {
    delay_seconds: u64,
    budget: i32,
}

impl Default for StabilizationPolicy {
    fn default() -> Self {
        Self::from_window(DEFAULT_DELAY, DEFAULT_MAX_WAIT)
    }
}

impl StabilizationPolicy {
    /// Derive the attempt budget from a wall-clock window
    ///
    /// The budget is `max_wait / delay`, so 25 minutes at 10 seconds gives 150.
    pub fn from_window(delay: Duration, max_wait: Duration) -> Self {
        let delay_seconds = delay.as_secs().max(1);
        let attempts = max_wait.as_secs() / delay_seconds;
        Self {
            delay_seconds,
            budget: i32::try_from(attempts).unwrap_or(i32::MAX),
        }
    }

    /// Seconds to wait before the next attempt
    pub fn delay_seconds(&self) -> u64 {
        self.delay_seconds
    }

    /// Total attempts allowed
    pub fn budget(&self) -> i32 {
        self.budget
    }

    /// A context carrying the full budget
    pub fn fresh_context(&self) -> CallbackContext {
        CallbackContext::new(self.budget)
    }

    /// Whether another attempt may be scheduled
    ///
    /// Zero means the budget is spent.
    pub fn should_continue(&self, remaining: i32) -> bool {
        remaining > 0
    }

    /// Counter to hand to the next attempt
    pub fn next_remaining(&self, remaining: i32) -> i32 {
        remaining.saturating_sub(1)
    }
}
