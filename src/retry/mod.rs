//! Retry engines for outbound provider calls.
//!
//! Two engines cover the two retry shapes in the crate:
//! - [`policy`]: attempt-counted retries with exponential delays, used by the
//!   HTTP transport.
//! - [`backoff`]: elapsed-time bounded retries built on the `backoff` crate,
//!   used by the model catalog.
//!
//! [`retry_with`] dispatches between them for callers that just want a
//! retried operation without holding an executor.

pub mod backoff;
pub mod policy;

pub use backoff::BackoffRetryExecutor;
pub use policy::{RetryExecutor, RetryPolicy};

use crate::error::GenError;

/// Which engine drives a [`retry_with`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryBackend {
    /// Elapsed-time bounded engine built on the `backoff` crate.
    #[default]
    Backoff,
    /// Attempt-counted engine driven by [`RetryPolicy`].
    Policy,
}

/// Options for [`retry_with`].
#[derive(Debug, Clone, Default)]
pub struct RetryOptions {
    backend: RetryBackend,
    policy: RetryPolicy,
}

impl RetryOptions {
    /// Elapsed-time bounded retries (the default).
    pub fn backoff() -> Self {
        Self {
            backend: RetryBackend::Backoff,
            ..Self::default()
        }
    }

    /// Attempt-counted retries.
    pub fn policy() -> Self {
        Self {
            backend: RetryBackend::Policy,
            ..Self::default()
        }
    }

    /// Replace the underlying policy wholesale.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cap the attempt count. The backoff engine derives its elapsed budget
    /// from this ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy = self.policy.with_max_attempts(max_attempts);
        self
    }
}

/// Run `operation` under the configured retry engine.
pub async fn retry_with<T, F, Fut>(operation: F, options: RetryOptions) -> Result<T, GenError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, GenError>>,
{
    match options.backend {
        RetryBackend::Backoff => {
            BackoffRetryExecutor::from_policy(&options.policy)
                .execute(operation)
                .await
        }
        RetryBackend::Policy => RetryExecutor::new(options.policy).execute(operation).await,
    }
}
