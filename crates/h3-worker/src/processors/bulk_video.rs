//! Bulk video upload: creates a draft per video, in concurrent batches of five.
//!
//! A batch only fails the job when every draft in it failed.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use h3_models::{BulkVideoUpload, Job, JobType};

use super::{decode_payload, run_batch};
use crate::error::WorkerResult;
use crate::logging::JobLogger;
use crate::processor::JobProcessor;
use crate::sink::ContentSink;

const BATCH_SIZE: usize = 5;

/// Creates one video draft per entry, five at a time.
pub struct BulkVideoProcessor {
    sink: Arc<dyn ContentSink>,
}

impl BulkVideoProcessor {
    pub fn new(sink: Arc<dyn ContentSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl JobProcessor for BulkVideoProcessor {
    fn job_type(&self) -> JobType {
        JobType::BulkVideoUpload
    }

    async fn process(&self, job: &Job) -> WorkerResult<()> {
        let upload: BulkVideoUpload = decode_payload(job)?;
        let logger = JobLogger::new(job);
        let creator_id = Arc::<str>::from(upload.creator_id.as_str());

        let mut created = 0;
        for (index, chunk) in upload.videos.chunks(BATCH_SIZE).enumerate() {
            let mut tasks = JoinSet::new();
            for video in chunk.iter().cloned() {
                let sink = Arc::clone(&self.sink);
                let creator_id = Arc::clone(&creator_id);
                tasks.spawn(async move {
                    match sink.create_video_draft(&creator_id, &video).await {
                        Ok(()) => Ok(video.title),
                        Err(e) => Err((video.title, e)),
                    }
                });
            }
            created += run_batch(&logger, index + 1, tasks).await?;
        }

        logger.log_progress(&format!(
            "{} of {} video drafts created",
            created,
            upload.videos.len()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkerError;
    use crate::sink::MockContentSink;
    use serde_json::json;

    fn job(videos: usize) -> Job {
        let videos: Vec<_> = (0..videos)
            .map(|i| json!({ "title": format!("Video {}", i), "youtubeId": "dQw4w9WgXcQ" }))
            .collect();
        Job::new(
            JobType::BulkVideoUpload,
            json!({ "videos": videos, "creatorId": "creator-1" }),
        )
    }

    #[tokio::test]
    async fn test_every_video_reaches_the_sink() {
        let mut sink = MockContentSink::new();
        sink.expect_create_video_draft()
            .times(12)
            .returning(|creator, _| {
                assert_eq!(creator, "creator-1");
                Ok(())
            });
        let processor = BulkVideoProcessor::new(Arc::new(sink));
        processor.process(&job(12)).await.unwrap();
    }

    #[tokio::test]
    async fn test_partial_failure_is_tolerated() {
        let mut sink = MockContentSink::new();
        sink.expect_create_video_draft().returning(|_, video| {
            if video.title == "Video 0" {
                Err(anyhow::anyhow!("duplicate"))
            } else {
                Ok(())
            }
        });
        let processor = BulkVideoProcessor::new(Arc::new(sink));
        processor.process(&job(3)).await.unwrap();
    }

    #[tokio::test]
    async fn test_whole_batch_failure_fails_the_run() {
        let mut sink = MockContentSink::new();
        sink.expect_create_video_draft()
            .returning(|_, _| Err(anyhow::anyhow!("cms down")));
        let processor = BulkVideoProcessor::new(Arc::new(sink));
        let err = processor.process(&job(2)).await.unwrap_err();
        assert!(matches!(err, WorkerError::ProcessingFailed(_)));
        assert!(!err.is_permanent_failure());
    }

    #[tokio::test]
    async fn test_wrong_payload_is_permanent() {
        let processor = BulkVideoProcessor::new(Arc::new(MockContentSink::new()));
        let job = Job::new(JobType::BulkVideoUpload, json!({ "blogs": [] }));
        let err = processor.process(&job).await.unwrap_err();
        assert!(err.is_permanent_failure());
    }
}
