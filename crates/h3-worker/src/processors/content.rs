//! Content processing: runs the requested operations in order.

use std::time::Duration;

use async_trait::async_trait;

use h3_models::{ContentProcessing, Job, JobType};

use super::decode_payload;
use crate::error::WorkerResult;
use crate::logging::JobLogger;
use crate::processor::JobProcessor;

/// Runs the requested operations on a piece of content, in order.
pub struct ContentProcessor {
    operation_delay: Duration,
}

impl ContentProcessor {
    pub fn new(operation_delay: Duration) -> Self {
        Self { operation_delay }
    }
}

#[async_trait]
impl JobProcessor for ContentProcessor {
    fn job_type(&self) -> JobType {
        JobType::ContentProcessing
    }

    async fn process(&self, job: &Job) -> WorkerResult<()> {
        let request: ContentProcessing = decode_payload(job)?;
        let logger = JobLogger::new(job);

        for operation in &request.operations {
            logger.log_progress(&format!(
                "{} on {:?} {}",
                operation, request.content_type, request.content_id
            ));
            tokio::time::sleep(self.operation_delay).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_one_step_per_operation() {
        let processor = ContentProcessor::new(Duration::from_secs(1));
        let job = Job::new(
            JobType::ContentProcessing,
            json!({ "contentId": "c1", "contentType": "video", "operations": ["a", "b", "c"] }),
        );

        let started = tokio::time::Instant::now();
        processor.process(&job).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_missing_operations_is_permanent() {
        let processor = ContentProcessor::new(Duration::ZERO);
        let job = Job::new(
            JobType::ContentProcessing,
            json!({ "contentId": "c1", "contentType": "video" }),
        );
        assert!(processor.process(&job).await.unwrap_err().is_permanent_failure());
    }
}
