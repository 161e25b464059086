//! Bounded retry with exponential backoff
//!
//! Every remote call the pipeline makes goes through [`RetryPolicy::run`]. Each failed
//! attempt is logged as a `retry_attempt_failed` warning carrying the error's category
//! and message. When the attempts run out the last error is returned unchanged; deciding
//! what a failure means is left to the caller.

use std::future::Future;
use std::time::Duration;

use gemsync_core::SyncResult;
use tracing::warn;

/// Attempts per remote call unless configured otherwise
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            multiplier: 1.5,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let cap = self.max_delay.as_millis() as f64;

        // NaN (0 * inf) and overflow both land on the cap
        Duration::from_millis(millis.min(cap) as u64)
    }
}

/// Re-executes fallible async operations according to a [`RetryConfig`]
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds or `max_attempts` attempts have failed.
    ///
    /// `label` names the operation in the warning emitted for every failed attempt.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(
                        event = "retry_attempt_failed",
                        operation = label,
                        attempt,
                        max_attempts,
                        error_category = error.category(),
                        error_message = %error,
                        recoverable = error.is_recoverable(),
                        "remote call failed"
                    );

                    // Don't wait after the final attempt
                    if attempt >= max_attempts {
                        return Err(error);
                    }

                    let delay = self.config.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
