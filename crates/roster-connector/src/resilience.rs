//! Resilience patterns for remote calls.
//!
//! Provides bounded retry with exponential backoff and a per-call timeout.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Result of a retried call together with the number of attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: RemoteResult<T>,
    pub attempts: u32,
}

/// Retry executor with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new retry executor with the given configuration.
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create a new retry executor with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Calculate delay before retry number `retry` (0-indexed).
    fn calculate_delay(&self, retry: u32) -> Duration {
        let base_delay = self.config.initial_delay.as_millis() as f64
            * self.config.backoff_multiplier.powi(retry as i32);

        let delay_ms = base_delay.min(self.config.max_delay.as_millis() as f64);

        let final_delay = if self.config.jitter {
            // Add up to 25% jitter
            let jitter_factor = 1.0 + rand::thread_rng().gen_range(0.0..0.25);
            delay_ms * jitter_factor
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay as u64)
    }

    /// Execute an operation, retrying transient errors.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) => {
                    if !e.is_transient() || attempt >= max_attempts {
                        return Attempted {
                            result: Err(e),
                            attempts: attempt,
                        };
                    }

                    let delay = self.calculate_delay(attempt - 1);
                    debug!(
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Execute an operation with retries, bounding every attempt by `timeout`.
    ///
    /// An attempt that exceeds the timeout yields [`RemoteError::Timeout`],
    /// which is not retried.
    pub async fn execute_with_timeout<F, Fut, T>(
        &self,
        timeout: Duration,
        mut operation: F,
    ) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let timeout_ms = timeout.as_millis() as u64;
        self.execute(|| {
            let call = operation();
            async move {
                match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(RemoteError::Timeout { timeout_ms }),
                }
            }
        })
        .await
    }
}
