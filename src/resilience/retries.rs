//! Retry policy.
//!
//! # Responsibilities
//! - Decide whether a failed forward is retried against the same backend
//! - Decide whether another backend may be selected for the request
//!
//! # Design Decisions
//! - Fixed backoff between local retries; no jitter
//! - Backend selections are capped (default: pool size) so a request always terminates

use std::time::Duration;

use crate::config::FailoverConfig;
use crate::dispatch::attempt::AttemptState;

/// Bounds on local retries and backend re-selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries against one backend before it is marked dead.
    pub local_retries: u32,
    /// Delay before each local retry.
    pub backoff: Duration,
    /// Maximum backend selections per request.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Build a policy from configuration. An unset attempt cap becomes the pool size.
    pub fn from_config(config: &FailoverConfig, pool_size: usize) -> Self {
        let max_attempts = config
            .max_attempts
            .unwrap_or_else(|| u32::try_from(pool_size).unwrap_or(u32::MAX))
            .max(1);

        Self {
            local_retries: config.local_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
            max_attempts,
        }
    }

    /// Whether another retry against the current backend is allowed.
    pub fn can_retry_locally(&self, state: &AttemptState) -> bool {
        state.local_retries < self.local_retries
    }

    /// Whether the request may select a backend in its current attempt.
    pub fn can_attempt(&self, state: &AttemptState) -> bool {
        state.attempts <= self.max_attempts
    }
}
