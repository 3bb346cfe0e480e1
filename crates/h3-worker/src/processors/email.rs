//! Email notification delivery.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use h3_models::{EmailNotification, Job, JobType};

use super::decode_payload;
use crate::error::WorkerResult;
use crate::processor::JobProcessor;

/// Delivers notification emails. Only logs them for now.
pub struct EmailProcessor {
    send_delay: Duration,
}

impl Default for EmailProcessor {
    fn default() -> Self {
        Self {
            send_delay: Duration::from_millis(500),
        }
    }
}

#[async_trait]
impl JobProcessor for EmailProcessor {
    fn job_type(&self) -> JobType {
        JobType::EmailNotifications
    }

    async fn process(&self, job: &Job) -> WorkerResult<()> {
        let email: EmailNotification = decode_payload(job)?;
        tokio::time::sleep(self.send_delay).await;
        info!(
            job_id = %job.id,
            recipients = email.recipients.len(),
            "Sent email notification: {}", email.subject
        );
        Ok(())
    }
}
