//! Monitor timing options

use std::time::Duration;

/// Poll loop options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Wait between polls
    pub interval: Duration,

    /// Polls before giving up; attempt-counted, not wall-clock
    pub max_attempts: u32,

    /// Retry policy for a single status check
    pub retry: RetryPolicy,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_attempts: 60,
            retry: RetryPolicy::default(),
        }
    }
}

/// Fixed-backoff retry for transient network failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,

    /// Wait between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}
