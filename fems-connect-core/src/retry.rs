//! Reconnect backoff.
//!
//! The client is meant to run unattended for months, so the policy is a
//! constant delay with no growth, no jitter and no attempt cap.

use std::time::Duration;

/// Delay inserted before every reconnect attempt after the first
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Fixed-delay reconnect policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delay: Duration,
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay before each reconnect attempt
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
