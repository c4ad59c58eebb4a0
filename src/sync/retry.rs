//! Retry manager for upstream calls
//!
//! Every failure is retried the same way: pace for a fixed delay, then try
//! again, up to `max_retries` times after the initial attempt.

use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

use super::pacing::Pacer;
use crate::config::RetryConfig;

/// Retry manager with a fixed inter-attempt delay
#[derive(Debug, Clone)]
pub struct RetryManager {
    max_retries: u32,
    pacer: Pacer,
}

impl RetryManager {
    /// Create a retry manager pacing with `pacer` between attempts
    pub fn new(max_retries: u32, pacer: Pacer) -> Self {
        Self { max_retries, pacer }
    }

    /// Create a retry manager from configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, Pacer::new(config.retry_delay()))
    }

    /// Maximum number of retries after the initial attempt
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Execute an async operation with retry logic
    ///
    /// Returns the first success, or the error of the last attempt once
    /// `max_retries + 1` attempts have failed.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if attempt > self.max_retries {
                        warn!(
                            attempts = attempt,
                            max_retries = self.max_retries,
                            error = %err,
                            "Max retries exhausted"
                        );
                        return Err(err);
                    }

                    debug!(
                        attempt = attempt,
                        max_retries = self.max_retries,
                        delay_ms = self.pacer.delay().as_millis(),
                        error = %err,
                        "Retrying after failed attempt"
                    );
                    self.pacer.pace().await;
                }
            }
        }
    }
}
