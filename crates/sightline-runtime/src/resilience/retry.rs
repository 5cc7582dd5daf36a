//! Retry policy for upstream calls.
//!
//! Exponential backoff with jitter over `backon`. The attempt budget
//! includes the first try: `max_attempts = 3` means one call and at most
//! two retries.

use backon::ExponentialBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, first call included
    pub max_attempts: u32,

    /// Delay before the first retry; doubles each retry after that
    #[serde(with = "crate::config::duration_str")]
    pub base_delay: Duration,

    /// Ceiling on any single delay
    #[serde(with = "crate::config::duration_str")]
    pub max_delay: Duration,

    /// Add random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Build the backoff schedule for one logical operation.
    pub fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}
