//! Job lifecycle states.
//!
//! ```text
//! queued --> processing --> completed
//!               |---------> failed      (attempts exhausted)
//!               |---------> queued      (retry)
//! queued --> failed                     (no processor)
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker, either fresh or scheduled for retry
    #[default]
    #[serde(alias = "pending", alias = "retrying")]
    Queued,
    /// Picked up by a worker
    Processing,
    /// Finished successfully
    Completed,
    /// Gave up; `Job::error` carries the reason
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Processing)
                | (Queued, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Queued)
        )
    }

    /// Coarse completion estimate. Not a real percentage.
    pub fn progress(&self) -> u8 {
        match self {
            JobStatus::Completed => 100,
            JobStatus::Processing => 50,
            JobStatus::Failed => 0,
            JobStatus::Queued => 10,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected state change.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Illegal job transition from {from} to {to}")]
    Illegal { from: JobStatus, to: JobStatus },

    #[error("Job has used all {max_attempts} attempts")]
    AttemptsExhausted { max_attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_heuristic() {
        assert_eq!(JobStatus::Completed.progress(), 100);
        assert_eq!(JobStatus::Processing.progress(), 50);
        assert_eq!(JobStatus::Failed.progress(), 0);
        assert_eq!(JobStatus::Queued.progress(), 10);
    }

    #[test]
    fn test_terminal_states_are_sinks() {
        let all = [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ];
        for terminal in [JobStatus::Completed, JobStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in all {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_retry_edge() {
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Queued));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn test_legacy_aliases() {
        let s: JobStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(s, JobStatus::Queued);
        let s: JobStatus = serde_json::from_str("\"retrying\"").unwrap();
        assert_eq!(s, JobStatus::Queued);
        assert_eq!(serde_json::to_string(&JobStatus::Queued).unwrap(), "\"queued\"");
    }
}
