//! In-memory job registry.
//!
//! Owned explicitly and injected where needed; only consistent within one
//! process, so multi-instance deployments use the Redis registry.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use h3_models::{Job, JobId, TransitionError};

use crate::error::{QueueError, QueueResult};
use crate::registry::{ensure_monotonic, JobRegistry, QueueStats};

#[derive(Debug, Clone)]
struct Entry {
    job: Job,
    /// Set once the job is terminal
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

#[derive(Debug)]
pub struct MemoryJobRegistry {
    jobs: RwLock<HashMap<JobId, Entry>>,
    retention: Duration,
}

impl MemoryJobRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            retention,
        }
    }

    fn expiry_for(&self, job: &Job) -> Option<DateTime<Utc>> {
        job.is_terminal()
            .then(|| Utc::now() + chrono::Duration::milliseconds(self.retention.as_millis() as i64))
    }
}

impl Default for MemoryJobRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[async_trait]
impl JobRegistry for MemoryJobRegistry {
    async fn insert(&self, job: &Job) -> QueueResult<()> {
        let entry = Entry {
            job: job.clone(),
            expires_at: self.expiry_for(job),
        };
        self.jobs.write().await.insert(job.id.clone(), entry);
        Ok(())
    }

    async fn get(&self, id: &JobId) -> QueueResult<Option<Job>> {
        let now = Utc::now();
        Ok(self
            .jobs
            .read()
            .await
            .get(id)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.job.clone()))
    }

    async fn save(&self, job: &Job) -> QueueResult<()> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs
            .get_mut(&job.id)
            .ok_or_else(|| QueueError::JobNotFound(job.id.clone()))?;
        ensure_monotonic(&entry.job, job)?;

        entry.job = job.clone();
        entry.expires_at = self.expiry_for(job);
        Ok(())
    }

    async fn claim_next(&self) -> QueueResult<Option<Job>> {
        let now = Utc::now();
        let mut jobs = self.jobs.write().await;

        loop {
            let Some(id) = jobs
                .values()
                .filter(|e| e.job.is_claimable(now))
                .min_by_key(|e| (e.job.priority.rank(), e.job.created_at))
                .map(|e| e.job.id.clone())
            else {
                return Ok(None);
            };

            let Some(entry) = jobs.get_mut(&id) else {
                return Ok(None);
            };

            match entry.job.start() {
                Ok(()) => {
                    debug!(job_id = %id, attempt = entry.job.attempts, "Claimed job");
                    return Ok(Some(entry.job.clone()));
                }
                Err(TransitionError::AttemptsExhausted { max_attempts }) => {
                    // Stored as queued with no attempts left; settle it and look again.
                    warn!(job_id = %id, max_attempts, "Queued job has no attempts left");
                    entry.job.fail("Maximum attempts exhausted")?;
                    entry.expires_at = self.expiry_for(&entry.job);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn stats(&self) -> QueueResult<QueueStats> {
        let now = Utc::now();
        let jobs = self.jobs.read().await;
        Ok(QueueStats::tally(
            jobs.values().filter(|e| !e.is_expired(now)).map(|e| &e.job),
        ))
    }

    async fn purge_expired(&self) -> QueueResult<usize> {
        let now = Utc::now();
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, e| !e.is_expired(now));
        Ok(before - jobs.len())
    }

    async fn ping(&self) -> QueueResult<()> {
        Ok(())
    }
}
