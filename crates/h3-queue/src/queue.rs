//! Job submission facade.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use h3_models::{
    BulkBlogUpload, BulkVideoUpload, ContentProcessing, EmailNotification, Job, JobId,
    JobPriority, JobType,
};

use crate::error::QueueResult;
use crate::metrics;
use crate::registry::{JobRegistry, QueueStats};

/// Entry point for submitting jobs and reading their status.
#[derive(Clone)]
pub struct JobQueue {
    registry: Arc<dyn JobRegistry>,
}

impl JobQueue {
    pub fn new(registry: Arc<dyn JobRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<dyn JobRegistry> {
        &self.registry
    }

    /// Register a queued job and return its id.
    pub async fn submit(&self, job: Job) -> QueueResult<JobId> {
        self.registry.insert(&job).await?;

        info!(
            job_id = %job.id,
            job_type = %job.job_type,
            priority = job.priority.as_str(),
            created_by = job.created_by.as_deref().unwrap_or("-"),
            "Job added to queue"
        );
        metrics::record_job_submitted(job.job_type.as_str(), job.priority.as_str());

        Ok(job.id)
    }

    pub async fn submit_bulk_video_upload(
        &self,
        upload: BulkVideoUpload,
        priority: JobPriority,
    ) -> QueueResult<JobId> {
        upload.validate()?;
        let creator = upload.creator_id.clone();
        let job = Job::new(JobType::BulkVideoUpload, serde_json::to_value(&upload)?)
            .with_priority(priority)
            .with_created_by(creator);
        self.submit(job).await
    }

    pub async fn submit_bulk_blog_upload(
        &self,
        upload: BulkBlogUpload,
        priority: JobPriority,
    ) -> QueueResult<JobId> {
        upload.validate()?;
        let creator = upload.creator_id.clone();
        let job = Job::new(JobType::BulkBlogUpload, serde_json::to_value(&upload)?)
            .with_priority(priority)
            .with_created_by(creator);
        self.submit(job).await
    }

    pub async fn submit_content_processing(
        &self,
        request: ContentProcessing,
        priority: JobPriority,
        created_by: Option<String>,
    ) -> QueueResult<JobId> {
        request.validate()?;
        let mut job = Job::new(JobType::ContentProcessing, serde_json::to_value(&request)?)
            .with_priority(priority);
        job.created_by = created_by;
        self.submit(job).await
    }

    pub async fn submit_email_notification(
        &self,
        notification: EmailNotification,
        priority: JobPriority,
    ) -> QueueResult<JobId> {
        notification.validate()?;
        let job = Job::new(
            JobType::EmailNotifications,
            serde_json::to_value(&notification)?,
        )
        .with_priority(priority);
        self.submit(job).await
    }

    /// Current record for `id`, `None` when unknown or purged.
    pub async fn status(&self, id: &JobId) -> QueueResult<Option<Job>> {
        self.registry.get(id).await
    }

    pub async fn stats(&self) -> QueueResult<QueueStats> {
        let stats = self.registry.stats().await?;
        metrics::set_queue_depth(stats.queued, stats.processing);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueueError;
    use crate::memory::MemoryJobRegistry;
    use h3_models::{BlogDraft, ContentKind, JobStatus, VideoDraft};

    fn queue() -> JobQueue {
        JobQueue::new(Arc::new(MemoryJobRegistry::default()))
    }

    #[tokio::test]
    async fn test_submit_and_read_back() {
        let queue = queue();
        let id = queue
            .submit_content_processing(
                ContentProcessing {
                    content_id: "c1".into(),
                    content_type: ContentKind::Blog,
                    operations: vec!["resize".into()],
                },
                JobPriority::High,
                Some("user-1".into()),
            )
            .await
            .unwrap();

        let job = queue.status(&id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.priority, JobPriority::High);
        assert_eq!(job.job_type, JobType::ContentProcessing);
        assert_eq!(job.created_by.as_deref(), Some("user-1"));
        assert_eq!(job.progress(), 10);

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.queued, 1);
    }

    #[tokio::test]
    async fn test_bulk_uploads_get_five_attempts() {
        let queue = queue();
        let id = queue
            .submit_bulk_video_upload(
                BulkVideoUpload {
                    videos: vec![VideoDraft {
                        title: "Episode 1".into(),
                        youtube_id: "dQw4w9WgXcQ".into(),
                        description: None,
                    }],
                    creator_id: "creator-9".into(),
                },
                JobPriority::Normal,
            )
            .await
            .unwrap();
        let job = queue.status(&id).await.unwrap().unwrap();
        assert_eq!(job.max_attempts, 5);
        assert_eq!(job.created_by.as_deref(), Some("creator-9"));

        let id = queue
            .submit_bulk_blog_upload(
                BulkBlogUpload {
                    blogs: vec![BlogDraft {
                        title: "Post".into(),
                        content: "Body".into(),
                        excerpt: None,
                    }],
                    creator_id: "creator-9".into(),
                },
                JobPriority::Low,
            )
            .await
            .unwrap();
        assert_eq!(queue.status(&id).await.unwrap().unwrap().max_attempts, 5);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected() {
        let queue = queue();
        let err = queue
            .submit_bulk_video_upload(
                BulkVideoUpload {
                    videos: vec![],
                    creator_id: "creator-9".into(),
                },
                JobPriority::Normal,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Validation(_)));
        assert_eq!(queue.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        assert!(queue()
            .status(&JobId::from("job_42"))
            .await
            .unwrap()
            .is_none());
    }
}
