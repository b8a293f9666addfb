//! Policy-based retries
//!
//! A fixed attempt ceiling with exponential backoff and jitter. Used
//! for idempotent GETs, where every attempt is logged so retry counts
//! stay observable in diagnostics.

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::GenError;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Ceiling on any single delay
    pub max_delay: Duration,
    /// Multiplier applied per retry
    pub backoff_multiplier: f64,
    /// Whether to randomize delays
    pub use_jitter: bool,
    /// Jitter as a fraction of the delay, `0.0..=1.0`
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::defaults::retry::MAX_ATTEMPTS,
            initial_delay: crate::defaults::retry::INITIAL_DELAY,
            max_delay: crate::defaults::retry::MAX_DELAY,
            backoff_multiplier: crate::defaults::retry::BACKOFF_MULTIPLIER,
            use_jitter: true,
            jitter_factor: crate::defaults::retry::JITTER_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum attempts.
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay before the first retry.
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay ceiling.
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter.
    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Set the jitter fraction.
    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Whether an error is worth another attempt.
    pub fn should_retry(&self, error: &GenError) -> bool {
        error.is_retryable()
    }

    /// Delay to apply after a given zero-based attempt.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(base_delay as u64).min(self.max_delay);

        if self.use_jitter {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::thread_rng();
        let jitter_range = delay.as_millis() as f64 * self.jitter_factor;
        if jitter_range <= 0.0 {
            return delay;
        }
        let jitter = rng.gen_range(-jitter_range..=jitter_range);
        let new_delay = delay.as_millis() as f64 + jitter;
        Duration::from_millis(new_delay.max(0.0) as u64)
    }
}

/// Retry executor that drives the attempt loop
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create an executor with the given policy.
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Execute an operation, retrying per policy.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, GenError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, GenError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.policy.max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !self.policy.should_retry(&error) {
                        return Err(error);
                    }
                    if attempt == self.policy.max_attempts - 1 {
                        last_error = Some(error);
                        break;
                    }

                    let delay = self.policy.calculate_delay(attempt);
                    tracing::warn!(
                        target: "anygen::http",
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying after failure"
                    );
                    last_error = Some(error);
                    sleep(delay).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GenError::ConnectionError("retry executor finished without an error".to_string())
        }))
    }
}
