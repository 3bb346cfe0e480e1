//! Job registry trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use h3_models::{Job, JobId, JobStatus, TransitionError};

use crate::error::QueueResult;

/// Point-in-time counts of jobs by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: u64,
    pub queued: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    /// Jobs running right now across all workers
    pub processing_concurrency: u64,
}

impl QueueStats {
    /// Tally a set of jobs.
    pub fn tally<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let mut stats = Self::default();
        for job in jobs {
            stats.total += 1;
            match job.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats.processing_concurrency = stats.processing;
        stats
    }
}

/// Shared record of job lifecycle states, keyed by job id.
///
/// The API reads from it; workers write transitions into it. A single
/// worker owns a job between `claim_next` and the terminal `save`.
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Register a freshly submitted (queued) job.
    async fn insert(&self, job: &Job) -> QueueResult<()>;

    async fn get(&self, id: &JobId) -> QueueResult<Option<Job>>;

    /// Persist a job after a transition. Queued jobs are (re)scheduled at
    /// `ready_at`; terminal jobs start their retention countdown.
    async fn save(&self, job: &Job) -> QueueResult<()>;

    /// Pop the most urgent claimable job and move it to processing.
    async fn claim_next(&self) -> QueueResult<Option<Job>>;

    async fn stats(&self) -> QueueResult<QueueStats>;

    /// Drop terminal jobs past retention. Returns how many were removed.
    async fn purge_expired(&self) -> QueueResult<usize>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> QueueResult<()>;
}

/// Refuse writes that would move a stored job out of a terminal state.
pub(crate) fn ensure_monotonic(stored: &Job, next: &Job) -> Result<(), TransitionError> {
    if stored.status.is_terminal() && stored.status != next.status {
        return Err(TransitionError::Illegal {
            from: stored.status,
            to: next.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3_models::JobType;
    use serde_json::json;

    #[test]
    fn test_tally() {
        let mut a = Job::new(JobType::ContentProcessing, json!({}));
        let b = Job::new(JobType::ContentProcessing, json!({}));
        let mut c = Job::new(JobType::ContentProcessing, json!({}));
        a.start().unwrap();
        c.start().unwrap();
        c.complete().unwrap();

        let stats = QueueStats::tally([&a, &b, &c]);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.processing, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.processing_concurrency, 1);
    }

    #[test]
    fn test_ensure_monotonic() {
        let mut done = Job::new(JobType::ContentProcessing, json!({}));
        done.start().unwrap();
        done.complete().unwrap();

        let mut reverted = done.clone();
        reverted.status = JobStatus::Queued;
        assert!(ensure_monotonic(&done, &reverted).is_err());
        assert!(ensure_monotonic(&done, &done).is_ok());
    }
}
