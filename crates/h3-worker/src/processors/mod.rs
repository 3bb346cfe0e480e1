//! Built-in job processors.

mod bulk_blog;
mod bulk_video;
mod content;
mod email;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use validator::Validate;

use h3_models::Job;

pub use bulk_blog::BulkBlogProcessor;
pub use bulk_video::BulkVideoProcessor;
pub use content::ContentProcessor;
pub use email::EmailProcessor;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::processor::ProcessorRegistry;
use crate::sink::ContentSink;

/// Registry holding every built-in processor.
pub fn default_processors(sink: Arc<dyn ContentSink>, config: &WorkerConfig) -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(Arc::new(BulkVideoProcessor::new(Arc::clone(&sink))));
    registry.register(Arc::new(BulkBlogProcessor::new(sink)));
    registry.register(Arc::new(ContentProcessor::new(config.operation_delay)));
    registry.register(Arc::new(EmailProcessor::default()));
    registry
}

/// Decode and validate a job payload. Mismatches are permanent failures.
pub(crate) fn decode_payload<T>(job: &Job) -> WorkerResult<T>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = serde_json::from_value(job.payload.clone())?;
    payload
        .validate()
        .map_err(|e| WorkerError::invalid_payload(e.to_string()))?;
    Ok(payload)
}

/// Run one batch of draft creations concurrently.
///
/// Individual failures are logged; the batch only fails when nothing in it
/// succeeded.
pub(crate) async fn run_batch(
    logger: &JobLogger,
    batch: usize,
    mut tasks: JoinSet<Result<String, (String, anyhow::Error)>>,
) -> WorkerResult<usize> {
    let total = tasks.len();
    let mut created = 0;
    let mut last_error = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(title)) => {
                created += 1;
                logger.log_progress(&format!("created draft '{}'", title));
            }
            Ok(Err((title, e))) => {
                logger.log_warning(&format!("draft '{}' failed: {:#}", title, e));
                last_error = Some(e.to_string());
            }
            Err(e) => {
                logger.log_warning(&format!("draft task aborted: {}", e));
                last_error = Some(e.to_string());
            }
        }
    }

    if total > 0 && created == 0 {
        return Err(WorkerError::processing_failed(format!(
            "batch {} failed: {}",
            batch,
            last_error.unwrap_or_default()
        )));
    }
    Ok(created)
}
