//! Job lifecycle metrics.

use metrics::{counter, gauge};

/// Metric name constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "h3_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "h3_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "h3_jobs_failed_total";
    pub const JOBS_RETRIED_TOTAL: &str = "h3_jobs_retried_total";
    pub const JOBS_QUEUED: &str = "h3_jobs_queued";
    pub const JOBS_PROCESSING: &str = "h3_jobs_processing";
}

pub fn record_job_submitted(job_type: &str, priority: &str) {
    counter!(
        names::JOBS_SUBMITTED_TOTAL,
        "type" => job_type.to_string(),
        "priority" => priority.to_string()
    )
    .increment(1);
}

pub fn record_job_completed(job_type: &str) {
    counter!(names::JOBS_COMPLETED_TOTAL, "type" => job_type.to_string()).increment(1);
}

pub fn record_job_failed(job_type: &str) {
    counter!(names::JOBS_FAILED_TOTAL, "type" => job_type.to_string()).increment(1);
}

pub fn record_job_retried(job_type: &str) {
    counter!(names::JOBS_RETRIED_TOTAL, "type" => job_type.to_string()).increment(1);
}

/// Update queue depth gauges from a stats snapshot.
pub fn set_queue_depth(queued: u64, processing: u64) {
    gauge!(names::JOBS_QUEUED).set(queued as f64);
    gauge!(names::JOBS_PROCESSING).set(processing as f64);
}
