//! Asynchronous job handles
//!
//! Video targets that complete out-of-band return a job reference
//! instead of a finished payload. [`JobHandle`] carries that reference
//! together with the most recently observed [`JobState`]; state only
//! ever advances, never regresses, and terminal states are final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenError;

/// Final payload of a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    /// URL of the rendered clip, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Full provider status body at completion
    pub raw: Value,
}

/// Lifecycle state of a provider-side generation job
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Accepted but not started
    Queued,
    /// Running
    Processing,
    /// Finished successfully
    Completed {
        /// The job's final payload
        output: JobOutput,
    },
    /// Finished unsuccessfully, either reported by the provider or
    /// raised locally while polling
    Failed {
        /// What went wrong
        error: Box<GenError>,
    },
    /// Cancelled by the local caller; the provider-side job may still run
    Cancelled,
    /// The local polling deadline elapsed; the provider-side job may
    /// still run
    TimedOut,
}

impl JobState {
    /// Whether this state is final.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Cancelled | Self::TimedOut
        )
    }

    /// Whether the job is still queued or running.
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }

    /// Stable lowercase name, used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
        }
    }

    // Ordering used to reject regressions; all terminal states share a rank.
    const fn rank(&self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Processing => 1,
            _ => 2,
        }
    }
}

/// Handle to a provider-side asynchronous job
///
/// Created when a submission response carries a job id; updated in place
/// by the poller as new states are observed.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    id: String,
    status_url: String,
    created_at: DateTime<Utc>,
    state: JobState,
}

impl JobHandle {
    /// Create a handle for a freshly submitted job.
    pub fn new(id: impl Into<String>, status_url: impl Into<String>) -> Self {
        Self::with_state(id, status_url, JobState::Queued)
    }

    pub(crate) fn with_state(
        id: impl Into<String>,
        status_url: impl Into<String>,
        state: JobState,
    ) -> Self {
        Self {
            id: id.into(),
            status_url: status_url.into(),
            created_at: Utc::now(),
            state,
        }
    }

    /// The provider-assigned job id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute URL polled for status updates.
    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    /// When this handle was created locally.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The most recently observed state.
    pub const fn state(&self) -> &JobState {
        &self.state
    }

    /// Record a newly observed state.
    ///
    /// Regressions are ignored: a terminal state is never left, and a
    /// job that was seen `Processing` does not go back to `Queued`.
    pub(crate) fn record(&mut self, state: JobState) {
        if state.rank() >= self.state.rank() && !self.state.is_terminal() {
            self.state = state;
        }
    }
}
