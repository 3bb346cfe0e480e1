//! Bulk blog upload: creates blog drafts in concurrent batches of three,
//! deriving a 200-character excerpt when none is given.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use h3_models::{BulkBlogUpload, Job, JobType};

use super::{decode_payload, run_batch};
use crate::error::WorkerResult;
use crate::logging::JobLogger;
use crate::processor::JobProcessor;
use crate::sink::ContentSink;

const BATCH_SIZE: usize = 3;

/// Creates blog drafts three at a time.
pub struct BulkBlogProcessor {
    sink: Arc<dyn ContentSink>,
}

impl BulkBlogProcessor {
    pub fn new(sink: Arc<dyn ContentSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl JobProcessor for BulkBlogProcessor {
    fn job_type(&self) -> JobType {
        JobType::BulkBlogUpload
    }

    async fn process(&self, job: &Job) -> WorkerResult<()> {
        let upload: BulkBlogUpload = decode_payload(job)?;
        let logger = JobLogger::new(job);
        let creator_id = Arc::<str>::from(upload.creator_id.as_str());

        let mut created = 0;
        for (index, chunk) in upload.blogs.chunks(BATCH_SIZE).enumerate() {
            let mut tasks = JoinSet::new();
            for blog in chunk.iter().cloned() {
                let sink = Arc::clone(&self.sink);
                let creator_id = Arc::clone(&creator_id);
                tasks.spawn(async move {
                    let excerpt = blog.excerpt_or_default();
                    match sink.create_blog_draft(&creator_id, &blog, &excerpt).await {
                        Ok(()) => Ok(blog.title),
                        Err(e) => Err((blog.title, e)),
                    }
                });
            }
            created += run_batch(&logger, index + 1, tasks).await?;
        }

        logger.log_progress(&format!(
            "{} of {} blog drafts created",
            created,
            upload.blogs.len()
        ));
        Ok(())
    }
}
