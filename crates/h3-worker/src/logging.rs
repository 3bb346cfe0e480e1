//! Structured job logging.
//!
//! Every line carries the job id, type and attempt so a run can be
//! followed through the logs.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use h3_models::Job;

#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    job_type: &'static str,
    attempt: u32,
    max_attempts: u32,
}

impl JobLogger {
    pub fn new(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            job_type: job.job_type.as_str(),
            attempt: job.attempts,
            max_attempts: job.max_attempts,
        }
    }

    pub fn log_start(&self) {
        info!(
            job_id = %self.job_id,
            job_type = self.job_type,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            "Processing job"
        );
    }

    pub fn log_progress(&self, message: &str) {
        debug!(
            job_id = %self.job_id,
            job_type = self.job_type,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            job_type = self.job_type,
            attempt = self.attempt,
            "Job warning: {}", message
        );
    }

    pub fn log_retry(&self, error: &str, delay: Duration) {
        warn!(
            job_id = %self.job_id,
            job_type = self.job_type,
            attempt = self.attempt,
            next_attempt = self.attempt + 1,
            retry_delay_ms = delay.as_millis() as u64,
            error = %error,
            "Job processing error, scheduled for retry"
        );
    }

    pub fn log_failed(&self, error: &str) {
        error!(
            job_id = %self.job_id,
            job_type = self.job_type,
            attempts = self.attempt,
            error = %error,
            "Job failed"
        );
    }

    pub fn log_completion(&self, duration: Duration) {
        info!(
            job_id = %self.job_id,
            job_type = self.job_type,
            duration_ms = duration.as_millis() as u64,
            "Job completed"
        );
    }
}
