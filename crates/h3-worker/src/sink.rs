//! Destination for drafts created by bulk upload jobs.

use async_trait::async_trait;
use tracing::info;

use h3_models::{BlogDraft, VideoDraft};

/// Content management collaborator that persists drafts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSink: Send + Sync {
    async fn create_video_draft(&self, creator_id: &str, video: &VideoDraft) -> anyhow::Result<()>;

    /// `excerpt` is already defaulted from the content.
    async fn create_blog_draft(
        &self,
        creator_id: &str,
        blog: &BlogDraft,
        excerpt: &str,
    ) -> anyhow::Result<()>;
}

/// Sink that only records drafts in the log.
#[derive(Debug, Default, Clone)]
pub struct LoggingContentSink;

#[async_trait]
impl ContentSink for LoggingContentSink {
    async fn create_video_draft(&self, creator_id: &str, video: &VideoDraft) -> anyhow::Result<()> {
        info!(
            creator_id,
            youtube_id = %video.youtube_id,
            url = %video.youtube_url(),
            "Created video draft: {}", video.title
        );
        Ok(())
    }

    async fn create_blog_draft(
        &self,
        creator_id: &str,
        blog: &BlogDraft,
        excerpt: &str,
    ) -> anyhow::Result<()> {
        info!(
            creator_id,
            excerpt_len = excerpt.len(),
            "Created blog draft: {}", blog.title
        );
        Ok(())
    }
}
