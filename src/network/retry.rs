// src/network/retry.rs
//! Bounded retry for authority requests
//!
//! Every request on the submission path goes through [`RetryPolicy::run`]:
//! a failed attempt is retried after a fixed delay until `max_retries`
//! retries have been spent, then the last error is returned.

use crate::utils::error::MinerError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Retry settings as they appear in the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Seconds to wait between attempts
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

fn default_max_retries() -> u32 {
    2
}

fn default_delay_secs() -> u64 {
    10
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_secs: default_delay_secs(),
        }
    }
}

/// Fixed-delay retry: no backoff growth, no jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self::new(config.max_retries, Duration::from_secs(config.delay_secs))
    }
}

impl RetryPolicy {
    /// Creates a policy making at most `max_retries + 1` attempts
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Retries after the first attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait between attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds or the retries are exhausted
    ///
    /// # Arguments
    /// * `label` - Name of the operation, for log lines
    /// * `operation` - Produces a fresh future for every attempt
    ///
    /// # Returns
    /// The first success, or the error of the final attempt
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, MinerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MinerError>>,
    {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempts <= self.max_retries => {
                    log::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}s",
                        label,
                        attempts,
                        self.max_retries + 1,
                        e,
                        self.delay.as_secs()
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => {
                    log::error!("{} failed after {} attempts: {}", label, attempts, e);
                    return Err(e);
                }
            }
        }
    }
}
