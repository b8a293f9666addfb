//! Job polling
//!
//! A wait loop drives a [`JobHandle`] toward a terminal state: sleep one
//! interval, issue one status request, record what came back, repeat,
//! bounded by a wall-clock budget and an optional cooperative cancellation
//! handle. All timing runs on the tokio clock, so the termination logic is
//! testable with a paused runtime and a scripted status source.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::defaults;
use crate::error::GenError;
use crate::types::job::{JobHandle, JobState};
use crate::utils::CancelHandle;

/// Where the poller asks for job status. Implemented by the client over
/// HTTP, and by scripted sequences in tests.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    /// Fetch the current state of the job behind `handle`.
    async fn poll_status(&self, handle: &JobHandle) -> Result<JobState, GenError>;
}

/// Caller-tunable polling parameters.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Gap between consecutive status requests
    pub interval: Duration,
    /// Overall wait budget, measured from the start of the wait
    pub max_wait: Duration,
    /// Cooperative cancellation observed at every suspension point
    pub cancel: Option<CancelHandle>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: defaults::poll::INTERVAL,
            max_wait: defaults::poll::MAX_WAIT,
            cancel: None,
        }
    }
}

impl PollOptions {
    /// Options with the default cadence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gap between status requests.
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the overall wait budget.
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Attach a cancellation handle.
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Drive `handle` until it reaches a terminal state, the wait budget runs
/// out, or cancellation fires.
///
/// The loop sleeps before each status request; the submission response
/// already carried a status, so polling immediately would be redundant.
/// Provider-observed states are recorded on the handle; the poller-local
/// [`JobState::TimedOut`] and [`JobState::Cancelled`] outcomes are only
/// returned, leaving the handle resumable by a later wait. A status
/// request that still fails after transport retries propagates as an
/// error without touching the handle.
pub async fn wait(
    source: &dyn JobStatusSource,
    handle: &mut JobHandle,
    options: &PollOptions,
) -> Result<JobState, GenError> {
    if handle.state().is_terminal() {
        return Ok(handle.state().clone());
    }

    let started = Instant::now();
    loop {
        if until_cancelled(options.cancel.as_ref(), tokio::time::sleep(options.interval))
            .await
            .is_none()
        {
            tracing::info!(
                target: "anygen::poll",
                job_id = handle.id(),
                "wait cancelled during sleep"
            );
            return Ok(JobState::Cancelled);
        }

        let Some(polled) =
            until_cancelled(options.cancel.as_ref(), source.poll_status(handle)).await
        else {
            tracing::info!(
                target: "anygen::poll",
                job_id = handle.id(),
                "wait cancelled mid-request"
            );
            return Ok(JobState::Cancelled);
        };
        handle.record(polled?);

        let elapsed = started.elapsed();
        tracing::debug!(
            target: "anygen::poll",
            job_id = handle.id(),
            state = handle.state().name(),
            elapsed_ms = elapsed.as_millis() as u64,
            "polled job status"
        );

        if handle.state().is_terminal() {
            return Ok(handle.state().clone());
        }
        if elapsed >= options.max_wait {
            tracing::warn!(
                target: "anygen::poll",
                job_id = handle.id(),
                waited_ms = elapsed.as_millis() as u64,
                "wait budget exhausted, job left running"
            );
            return Ok(JobState::TimedOut);
        }
    }
}

/// Await `operation` unless `cancel` fires first; `None` means cancelled.
async fn until_cancelled<T>(
    cancel: Option<&CancelHandle>,
    operation: impl Future<Output = T>,
) -> Option<T> {
    match cancel {
        Some(cancel) => tokio::select! {
            _ = cancel.cancelled() => None,
            value = operation => Some(value),
        },
        None => Some(operation.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::job::JobOutput;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Scripted {
        script: Mutex<VecDeque<Result<JobState, GenError>>>,
        polls: AtomicU32,
    }

    impl Scripted {
        fn new(script: Vec<Result<JobState, GenError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                polls: AtomicU32::new(0),
            }
        }

        fn polls(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl JobStatusSource for Scripted {
        async fn poll_status(&self, _handle: &JobHandle) -> Result<JobState, GenError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(JobState::Processing))
        }
    }

    fn completed() -> JobState {
        JobState::Completed {
            output: JobOutput {
                video_url: Some("https://cdn.example.com/v.mp4".into()),
                raw: serde_json::json!({"status": "completed"}),
            },
        }
    }

    fn options(interval_secs: u64, max_wait_secs: u64) -> PollOptions {
        PollOptions::new()
            .with_interval(Duration::from_secs(interval_secs))
            .with_max_wait(Duration::from_secs(max_wait_secs))
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_three_polls_on_schedule() {
        let source = Scripted::new(vec![
            Ok(JobState::Processing),
            Ok(JobState::Processing),
            Ok(completed()),
        ]);
        let mut handle = JobHandle::new("job-1", "http://t/videos/job-1");

        let started = Instant::now();
        let state = wait(&source, &mut handle, &options(5, 20)).await.unwrap();

        assert!(matches!(state, JobState::Completed { .. }));
        assert_eq!(source.polls(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(15));
        assert!(elapsed < Duration::from_secs(20));
        assert!(handle.state().is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_exactly_two_polls() {
        let source = Scripted::new(vec![]);
        let mut handle = JobHandle::new("job-2", "http://t/videos/job-2");

        let state = wait(&source, &mut handle, &options(5, 10)).await.unwrap();

        assert_eq!(state, JobState::TimedOut);
        assert_eq!(source.polls(), 2);
        // The handle stays resumable; only the local wait gave up.
        assert_eq!(handle.state(), &JobState::Processing);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_handles_return_without_polling() {
        let source = Scripted::new(vec![]);
        let mut handle = JobHandle::with_state("job-3", "http://t/videos/job-3", completed());

        let state = wait(&source, &mut handle, &options(5, 20)).await.unwrap();

        assert!(matches!(state, JobState::Completed { .. }));
        assert_eq!(source.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_sleep_issues_no_poll() {
        let source = Scripted::new(vec![]);
        let mut handle = JobHandle::new("job-4", "http://t/videos/job-4");
        let cancel = CancelHandle::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let state = wait(&source, &mut handle, &options(5, 20).with_cancel(cancel))
            .await
            .unwrap();

        assert_eq!(state, JobState::Cancelled);
        assert_eq!(source.polls(), 0);
        assert_eq!(handle.state(), &JobState::Queued);
    }

    #[tokio::test(start_paused = true)]
    async fn provider_failure_is_recorded_and_returned() {
        let failed = JobState::Failed {
            error: Box::new(GenError::provider_error(
                "local",
                200,
                "job failed: nsfw filter",
                None,
            )),
        };
        let source = Scripted::new(vec![Ok(failed)]);
        let mut handle = JobHandle::new("job-5", "http://t/videos/job-5");

        let state = wait(&source, &mut handle, &options(5, 20)).await.unwrap();

        assert!(matches!(state, JobState::Failed { .. }));
        assert!(handle.state().is_terminal());
        assert_eq!(source.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_propagate_without_moving_the_handle() {
        let source = Scripted::new(vec![Err(GenError::ConnectionError("refused".into()))]);
        let mut handle = JobHandle::new("job-6", "http://t/videos/job-6");

        let error = wait(&source, &mut handle, &options(5, 20)).await.unwrap_err();

        assert!(matches!(error, GenError::ConnectionError(_)));
        assert_eq!(handle.state(), &JobState::Queued);
    }
}
