//! Job definitions for background processing.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job_status::{JobStatus, TransitionError};
use crate::utils::random_base36;

/// Backoff before the next attempt, indexed by `attempts - 1` and clamped to the last entry.
pub const RETRY_DELAYS: [Duration; 4] = [
    Duration::from_secs(1),
    Duration::from_secs(5),
    Duration::from_secs(15),
    Duration::from_secs(60),
];

/// Delay before retrying a job that just failed its `attempt`-th run (1-based).
pub fn retry_delay(attempt: u32) -> Duration {
    let idx = (attempt.saturating_sub(1) as usize).min(RETRY_DELAYS.len() - 1);
    RETRY_DELAYS[idx]
}

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new job ID: `job_{unix_ms}_{9 base-36 chars}`.
    pub fn new() -> Self {
        Self(format!(
            "job_{}_{}",
            Utc::now().timestamp_millis(),
            random_base36(9)
        ))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type of job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    BulkVideoUpload,
    BulkBlogUpload,
    ContentProcessing,
    ThumbnailGeneration,
    EmailNotifications,
    AnalyticsProcessing,
    ContentModeration,
    BackupOperations,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::BulkVideoUpload => "bulk-video-upload",
            JobType::BulkBlogUpload => "bulk-blog-upload",
            JobType::ContentProcessing => "content-processing",
            JobType::ThumbnailGeneration => "thumbnail-generation",
            JobType::EmailNotifications => "email-notifications",
            JobType::AnalyticsProcessing => "analytics-processing",
            JobType::ContentModeration => "content-moderation",
            JobType::BackupOperations => "backup-operations",
        }
    }

    /// Attempts allowed when the submitter does not say otherwise.
    pub fn default_max_attempts(&self) -> u32 {
        match self {
            JobType::BulkVideoUpload | JobType::BulkBlogUpload => 5,
            _ => 3,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl JobPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPriority::Low => "low",
            JobPriority::Normal => "normal",
            JobPriority::High => "high",
            JobPriority::Critical => "critical",
        }
    }

    /// Claim order, lower runs first.
    pub fn rank(&self) -> u8 {
        match self {
            JobPriority::Critical => 0,
            JobPriority::High => 1,
            JobPriority::Normal => 2,
            JobPriority::Low => 3,
        }
    }
}

/// What happened to a job whose processor returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Back in the queue, claimable after `delay`
    Retry { delay: Duration },
    /// Attempts exhausted, job is terminal
    Failed,
}

/// A unit of asynchronous work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,

    #[serde(rename = "type")]
    pub job_type: JobType,

    /// Type-specific input, see `crate::payload`
    #[serde(default)]
    pub payload: serde_json::Value,

    #[serde(default)]
    pub priority: JobPriority,

    #[serde(default)]
    pub status: JobStatus,

    /// Runs started so far
    #[serde(default)]
    pub attempts: u32,

    pub max_attempts: u32,

    pub created_at: DateTime<Utc>,

    /// Start of the most recent run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,

    /// Set when the job reaches a terminal state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Only set while `status == failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Earliest instant a worker may claim the job
    #[serde(default = "Utc::now")]
    pub ready_at: DateTime<Utc>,
}

impl Job {
    /// Create a queued job with the type's default attempt budget.
    pub fn new(job_type: JobType, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            job_type,
            payload,
            priority: JobPriority::default(),
            status: JobStatus::Queued,
            attempts: 0,
            max_attempts: job_type.default_max_attempts(),
            created_at: now,
            processed_at: None,
            completed_at: None,
            error: None,
            created_by: None,
            ready_at: now,
        }
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_created_by(mut self, user_id: impl Into<String>) -> Self {
        self.created_by = Some(user_id.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Derived progress value, see [`JobStatus::progress`].
    pub fn progress(&self) -> u8 {
        self.status.progress()
    }

    /// Whether a worker may pick this job up at `now`.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Queued && self.ready_at <= now
    }

    fn check(&self, to: JobStatus) -> Result<(), TransitionError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(TransitionError::Illegal {
                from: self.status,
                to,
            })
        }
    }

    /// queued -> processing. Counts an attempt.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.check(JobStatus::Processing)?;
        if self.attempts >= self.max_attempts {
            return Err(TransitionError::AttemptsExhausted {
                max_attempts: self.max_attempts,
            });
        }
        self.status = JobStatus::Processing;
        self.attempts += 1;
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// processing -> completed.
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.check(JobStatus::Completed)?;
        self.status = JobStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Record a failed run: re-queue with backoff while attempts remain, else fail.
    pub fn record_failure(
        &mut self,
        error: impl Into<String>,
    ) -> Result<FailureOutcome, TransitionError> {
        if self.attempts < self.max_attempts {
            self.check(JobStatus::Queued)?;
            let delay = retry_delay(self.attempts);
            self.status = JobStatus::Queued;
            self.ready_at = Utc::now()
                + chrono::Duration::milliseconds(delay.as_millis() as i64);
            Ok(FailureOutcome::Retry { delay })
        } else {
            self.fail(error)?;
            Ok(FailureOutcome::Failed)
        }
    }

    /// Fail immediately, from queued or processing.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.check(JobStatus::Failed)?;
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> Job {
        Job::new(JobType::ContentProcessing, json!({}))
    }

    #[test]
    fn test_job_id_format() {
        let id = JobId::new();
        let parts: Vec<&str> = id.as_str().splitn(3, '_').collect();
        assert_eq!(parts[0], "job");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn test_defaults() {
        let j = job();
        assert_eq!(j.status, JobStatus::Queued);
        assert_eq!(j.priority, JobPriority::Normal);
        assert_eq!(j.max_attempts, 3);
        assert_eq!(j.progress(), 10);
        assert_eq!(Job::new(JobType::BulkVideoUpload, json!({})).max_attempts, 5);
    }

    #[test]
    fn test_happy_path() {
        let mut j = job();
        j.start().unwrap();
        assert_eq!(j.status, JobStatus::Processing);
        assert_eq!(j.attempts, 1);
        assert!(j.processed_at.is_some());
        assert_eq!(j.progress(), 50);

        j.complete().unwrap();
        assert_eq!(j.status, JobStatus::Completed);
        assert!(j.completed_at.is_some());
        assert!(j.error.is_none());
        assert_eq!(j.progress(), 100);
    }

    #[test]
    fn test_retry_then_fail() {
        let mut j = job().with_max_attempts(2);

        j.start().unwrap();
        let outcome = j.record_failure("boom").unwrap();
        assert_eq!(outcome, FailureOutcome::Retry { delay: Duration::from_secs(1) });
        assert_eq!(j.status, JobStatus::Queued);
        assert!(j.error.is_none());
        assert!(!j.is_claimable(Utc::now()));
        assert!(j.is_claimable(Utc::now() + chrono::Duration::seconds(2)));

        j.start().unwrap();
        assert_eq!(j.record_failure("boom again").unwrap(), FailureOutcome::Failed);
        assert_eq!(j.status, JobStatus::Failed);
        assert_eq!(j.error.as_deref(), Some("boom again"));
        assert_eq!(j.attempts, j.max_attempts);
        assert_eq!(j.progress(), 0);
    }

    #[test]
    fn test_terminal_is_final() {
        let mut j = job();
        j.start().unwrap();
        j.complete().unwrap();

        let before = j.clone();
        assert!(j.start().is_err());
        assert!(j.fail("late").is_err());
        assert!(j.complete().is_err());
        assert_eq!(j, before);
    }

    #[test]
    fn test_attempts_never_exceed_max() {
        let mut j = job().with_max_attempts(1);
        j.start().unwrap();
        // Force back to queued to simulate a bad external writer.
        j.status = JobStatus::Queued;
        assert_eq!(
            j.start(),
            Err(TransitionError::AttemptsExhausted { max_attempts: 1 })
        );
        assert_eq!(j.attempts, 1);
    }

    #[test]
    fn test_retry_delays() {
        assert_eq!(retry_delay(1), Duration::from_secs(1));
        assert_eq!(retry_delay(2), Duration::from_secs(5));
        assert_eq!(retry_delay(3), Duration::from_secs(15));
        assert_eq!(retry_delay(4), Duration::from_secs(60));
        assert_eq!(retry_delay(40), Duration::from_secs(60));
    }

    #[test]
    fn test_priority_rank() {
        let mut ps = vec![
            JobPriority::Low,
            JobPriority::Critical,
            JobPriority::Normal,
            JobPriority::High,
        ];
        ps.sort_by_key(|p| p.rank());
        assert_eq!(
            ps,
            vec![
                JobPriority::Critical,
                JobPriority::High,
                JobPriority::Normal,
                JobPriority::Low
            ]
        );
    }

    #[test]
    fn test_wire_format() {
        let j = job().with_created_by("user-1");
        let value = serde_json::to_value(&j).unwrap();
        assert_eq!(value["type"], "content-processing");
        assert_eq!(value["status"], "queued");
        assert_eq!(value["maxAttempts"], 3);
        assert_eq!(value["createdBy"], "user-1");
        assert!(value.get("error").is_none());

        let back: Job = serde_json::from_value(value).unwrap();
        assert_eq!(back, j);
    }
}
