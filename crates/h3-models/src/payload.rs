//! Typed job payloads.
//!
//! Jobs carry their input as free-form JSON; submitters and processors go
//! through these types so both sides agree on the shape.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One video to create as a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// YouTube video id (always 11 chars)
    #[validate(length(equal = 11))]
    pub youtube_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

impl VideoDraft {
    pub fn youtube_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.youtube_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkVideoUpload {
    #[validate(length(min = 1, max = 500))]
    #[validate(nested)]
    pub videos: Vec<VideoDraft>,
    /// Filled in from the authenticated submitter
    #[serde(default)]
    pub creator_id: String,
}

/// One blog post to create as a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl BlogDraft {
    /// Explicit excerpt, or the first 200 characters of the content.
    pub fn excerpt_or_default(&self) -> String {
        match &self.excerpt {
            Some(e) if !e.is_empty() => e.clone(),
            _ => self.content.chars().take(200).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkBlogUpload {
    #[validate(length(min = 1, max = 200))]
    #[validate(nested)]
    pub blogs: Vec<BlogDraft>,
    #[serde(default)]
    pub creator_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Video,
    Blog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContentProcessing {
    #[validate(length(min = 1))]
    pub content_id: String,
    pub content_type: ContentKind,
    /// Named steps, run in order
    #[validate(length(min = 1, max = 50))]
    pub operations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotification {
    #[validate(length(min = 1))]
    pub recipients: Vec<String>,
    #[validate(length(min = 1, max = 300))]
    pub subject: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_video_upload_validation() {
        let ok: BulkVideoUpload = serde_json::from_value(json!({
            "videos": [{ "title": "Intro", "youtubeId": "dQw4w9WgXcQ" }]
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(
            ok.videos[0].youtube_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );

        let bad_id: BulkVideoUpload = serde_json::from_value(json!({
            "videos": [{ "title": "Intro", "youtubeId": "short" }]
        }))
        .unwrap();
        assert!(bad_id.validate().is_err());

        let empty: BulkVideoUpload = serde_json::from_value(json!({ "videos": [] })).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_blog_excerpt_default() {
        let blog = BlogDraft {
            title: "t".into(),
            content: "x".repeat(300),
            excerpt: None,
        };
        assert_eq!(blog.excerpt_or_default().len(), 200);

        let blog = BlogDraft {
            excerpt: Some("custom".into()),
            ..blog
        };
        assert_eq!(blog.excerpt_or_default(), "custom");
    }

    #[test]
    fn test_content_processing_shape() {
        let p: ContentProcessing = serde_json::from_value(json!({
            "contentId": "c1",
            "contentType": "video",
            "operations": ["thumbnail", "transcode"]
        }))
        .unwrap();
        assert!(p.validate().is_ok());
        assert_eq!(p.content_type, ContentKind::Video);

        let no_ops = ContentProcessing {
            operations: vec![],
            ..p
        };
        assert!(no_ops.validate().is_err());
    }
}
