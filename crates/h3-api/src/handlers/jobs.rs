//! Job submission and status handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use h3_models::{
    BulkBlogUpload, BulkVideoUpload, ContentProcessing, Job, JobId, JobPriority, JobStatus,
    JobType,
};
use h3_queue::QueueStats;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Success envelope shared by the job endpoints.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Job detail returned by the status endpoint.
///
/// Every field is always present; unset timestamps and `error` are `null`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusData {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub priority: JobPriority,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    /// Coarse status bucket, not a measured percentage
    pub progress: u8,
}

impl From<Job> for JobStatusData {
    fn from(job: Job) -> Self {
        let progress = job.progress();
        Self {
            id: job.id,
            job_type: job.job_type,
            status: job.status,
            priority: job.priority,
            attempts: job.attempts,
            max_attempts: job.max_attempts,
            created_at: job.created_at,
            processed_at: job.processed_at,
            completed_at: job.completed_at,
            error: job.error,
            progress,
        }
    }
}

/// GET /api/jobs/:job_id (also /jobs/:job_id)
///
/// Returns:
/// - 200: Job detail with computed progress
/// - 404: Unknown or purged job, whatever its shape
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Envelope<JobStatusData>>> {
    let job_id = JobId::from(job_id);

    let job = state.queue.status(&job_id).await.map_err(|e| {
        error!(job_id = %job_id, error = %e, "Failed to get job status");
        ApiError::from(e)
    })?;

    match job {
        Some(job) => Ok(Envelope::ok(job.into())),
        None => {
            debug!(job_id = %job_id, "Job not found");
            Err(ApiError::not_found("Job not found"))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub payload: Option<Value>,
    pub priority: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobData {
    pub job_id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub message: &'static str,
}

/// POST /api/jobs
///
/// Accepts `{type, payload, priority?}` for bulk video upload, bulk blog
/// upload and content processing jobs. The caller becomes `createdBy`.
pub async fn submit_job(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<SubmitJobRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<SubmitJobData>>> {
    let Json(request) =
        body.map_err(|e| ApiError::validation(format!("Invalid request body: {}", e.body_text())))?;

    let priority = parse_priority(request.priority.as_deref())?;
    let (Some(job_type), Some(payload)) = (request.job_type, request.payload) else {
        return Err(ApiError::validation("Missing job type or payload"));
    };

    let (job_type, submitted) = match job_type.as_str() {
        "bulk-video-upload" => {
            let mut upload: BulkVideoUpload = serde_json::from_value(payload)
                .map_err(|e| ApiError::validation(format!("Invalid videos array: {}", e)))?;
            upload.creator_id = user.uid.clone();
            (
                JobType::BulkVideoUpload,
                state.queue.submit_bulk_video_upload(upload, priority).await,
            )
        }
        "bulk-blog-upload" => {
            let mut upload: BulkBlogUpload = serde_json::from_value(payload)
                .map_err(|e| ApiError::validation(format!("Invalid blogs array: {}", e)))?;
            upload.creator_id = user.uid.clone();
            (
                JobType::BulkBlogUpload,
                state.queue.submit_bulk_blog_upload(upload, priority).await,
            )
        }
        "content-processing" => {
            let request: ContentProcessing = serde_json::from_value(payload).map_err(|e| {
                ApiError::validation(format!("Missing content processing parameters: {}", e))
            })?;
            (
                JobType::ContentProcessing,
                state
                    .queue
                    .submit_content_processing(request, priority, Some(user.uid.clone()))
                    .await,
            )
        }
        _ => return Err(ApiError::validation("Unknown job type")),
    };

    let job_id = submitted.map_err(|e| {
        let e = ApiError::from(e);
        if e.status_code().is_server_error() {
            error!(user_id = %user.uid, error = %e, "Job creation failed");
        }
        e
    })?;

    info!(
        job_id = %job_id,
        job_type = %job_type,
        user_id = %user.uid,
        priority = priority.as_str(),
        "Job created via API"
    );

    Ok(Envelope::ok(SubmitJobData {
        job_id,
        job_type,
        priority,
        status: JobStatus::Queued,
        message: "Job created successfully",
    }))
}

fn parse_priority(raw: Option<&str>) -> ApiResult<JobPriority> {
    match raw {
        None => Ok(JobPriority::default()),
        Some(p) => serde_json::from_value(Value::String(p.to_string()))
            .map_err(|_| ApiError::validation(format!("Invalid priority '{}'", p))),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatsData {
    pub queue_stats: QueueStats,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/jobs
pub async fn get_queue_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Envelope<QueueStatsData>>> {
    let queue_stats = state.queue.stats().await.map_err(|e| {
        error!(user_id = %user.uid, error = %e, "Failed to read queue stats");
        ApiError::from(e)
    })?;

    Ok(Envelope::ok(QueueStatsData {
        queue_stats,
        timestamp: Utc::now(),
    }))
}
