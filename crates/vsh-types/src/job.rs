//! Job identification and state types.

use serde::{Deserialize, Serialize};

/// Unique identifier for a background job. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a background job.
///
/// `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Job is currently running.
    Running,
    /// Job finished successfully.
    Completed,
    /// Job observed a cancellation request.
    Cancelled,
    /// Job finished with an error.
    Failed,
}

impl JobState {
    /// True for every state except `Running`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Running => write!(f, "Running"),
            JobState::Completed => write!(f, "Done"),
            JobState::Cancelled => write!(f, "Cancelled"),
            JobState::Failed => write!(f, "Failed"),
        }
    }
}

/// Information about a job for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    /// Job ID.
    pub id: JobId,
    /// The original command line, for display.
    pub command: String,
    /// Current state.
    pub state: JobState,
}
