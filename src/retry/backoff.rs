//! Elapsed-time bounded retry built on the `backoff` crate.
//!
//! Where [`RetryExecutor`](crate::retry::RetryExecutor) counts attempts, this
//! engine keeps retrying transient failures until a total elapsed budget runs
//! out. That shape suits background work such as model catalog refreshes,
//! where the caller cares about an overall deadline more than an exact
//! attempt number.

use std::time::Duration;

use backoff::future::retry_notify;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::error::GenError;
use crate::retry::policy::RetryPolicy;

/// Retry executor driven by an [`ExponentialBackoff`] schedule.
#[derive(Debug, Clone)]
pub struct BackoffRetryExecutor {
    backoff: ExponentialBackoff,
}

impl Default for BackoffRetryExecutor {
    fn default() -> Self {
        Self::from_policy(&RetryPolicy::default())
    }
}

impl BackoffRetryExecutor {
    /// Derive a schedule from the shared retry policy.
    ///
    /// The policy's initial delay, cap and multiplier carry over directly.
    /// The total elapsed budget is the delay cap times the attempt ceiling,
    /// so both retry engines give up in the same ballpark.
    pub fn from_policy(policy: &RetryPolicy) -> Self {
        let budget = policy.max_delay * policy.max_attempts.max(1);
        let randomization = if policy.use_jitter {
            policy.jitter_factor
        } else {
            0.0
        };
        Self {
            backoff: ExponentialBackoffBuilder::new()
                .with_initial_interval(policy.initial_delay)
                .with_max_interval(policy.max_delay)
                .with_multiplier(policy.backoff_multiplier)
                .with_randomization_factor(randomization)
                .with_max_elapsed_time(Some(budget))
                .build(),
        }
    }

    /// Use a fully custom backoff schedule.
    pub fn with_backoff(backoff: ExponentialBackoff) -> Self {
        Self { backoff }
    }

    /// Run `operation`, retrying retryable failures until the schedule gives
    /// up. Non-retryable errors abort on the spot.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, GenError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, GenError>>,
    {
        retry_notify(
            self.backoff.clone(),
            || {
                let fut = operation();
                async move {
                    fut.await.map_err(|error| {
                        if error.is_retryable() {
                            backoff::Error::transient(error)
                        } else {
                            backoff::Error::permanent(error)
                        }
                    })
                }
            },
            |error: GenError, wait: Duration| {
                tracing::warn!(
                    target: "anygen::http",
                    wait_ms = wait.as_millis() as u64,
                    error = %error,
                    "retrying after failure"
                );
            },
        )
        .await
    }
}
