//! Bounded retry with a fixed delay between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use super::GatewayError;
use crate::config::GatewaySettings;

/// Retry policy applied per operation.
///
/// Retry is blind: every error is retried the same way until the attempt cap
/// is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Sleep between a failed attempt and the next one.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a new RetryPolicy from gateway settings.
    pub fn new(settings: &GatewaySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            delay: settings.retry_delay,
        }
    }

    /// Whether another attempt follows the failed `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Run `operation` until it succeeds or the attempt cap is reached.
    ///
    /// Each failure is logged with its attempt number; each retry is announced
    /// before sleeping. The error of the last attempt is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, GatewayError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error!(
                        "Error {} (attempt {}/{}): {}",
                        label, attempt, max_attempts, e
                    );
                    if !self.should_retry(attempt) {
                        return Err(e);
                    }
                    warn!("Retrying in {}...", describe_delay(self.delay));
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

fn describe_delay(delay: Duration) -> String {
    if delay.subsec_millis() == 0 {
        format!("{} seconds", delay.as_secs())
    } else {
        format!("{} ms", delay.as_millis())
    }
}
