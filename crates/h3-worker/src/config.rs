//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// How often the registry is polled for ready jobs
    pub poll_interval: Duration,
    /// Per-run timeout; a timed out run counts as a failed attempt
    pub job_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// How often expired terminal jobs are purged
    pub purge_interval: Duration,
    /// Pause between content-processing operations
    pub operation_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            poll_interval: Duration::from_millis(1000),
            job_timeout: Duration::from_secs(600), // 10 minutes
            shutdown_timeout: Duration::from_secs(30),
            purge_interval: Duration::from_secs(60),
            operation_delay: Duration::from_millis(1000),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let production = std::env::var("ENVIRONMENT")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(if production { 10 } else { 3 }),
            poll_interval: Duration::from_millis(
                std::env::var("WORKER_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            job_timeout: Duration::from_secs(
                std::env::var("WORKER_JOB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            purge_interval: Duration::from_secs(
                std::env::var("WORKER_PURGE_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            operation_delay: Duration::from_millis(
                std::env::var("WORKER_OPERATION_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
        }
    }
}
