//! Worker error types.

use std::time::Duration;

use thiserror::Error;

use h3_models::{JobType, TransitionError};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("No processor available for {0}")]
    NoProcessor(JobType),

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Queue error: {0}")]
    Queue(#[from] h3_queue::QueueError),
}

impl WorkerError {
    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Errors that retrying cannot fix: the job fails on the spot.
    pub fn is_permanent_failure(&self) -> bool {
        matches!(
            self,
            WorkerError::InvalidPayload(_) | WorkerError::NoProcessor(_)
        )
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidPayload(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_failures() {
        assert!(WorkerError::invalid_payload("bad").is_permanent_failure());
        assert!(WorkerError::NoProcessor(JobType::BackupOperations).is_permanent_failure());
        assert!(!WorkerError::processing_failed("flaky").is_permanent_failure());
        assert!(!WorkerError::Timeout(Duration::from_secs(1)).is_permanent_failure());
    }
}
