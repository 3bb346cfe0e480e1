//! Shared data models for the H3 Network backend.
//!
//! This crate provides Serde-serializable types for:
//! - Guest viewing sessions and the view-limit decision
//! - Background jobs, their state machine and progress heuristic
//! - Typed job payloads with validation

pub mod guest;
pub mod job;
pub mod job_status;
pub mod payload;
pub mod utils;

// Re-export common types
pub use guest::{
    GuestSessionId, GuestViewingLimit, InvalidSessionId, ViewDecision, GUEST_VIEW_LIMIT,
    SESSION_COOKIE_MAX_AGE_SECS,
};
pub use job::{retry_delay, FailureOutcome, Job, JobId, JobPriority, JobType, RETRY_DELAYS};
pub use job_status::{JobStatus, TransitionError};
pub use payload::{
    BlogDraft, BulkBlogUpload, BulkVideoUpload, ContentKind, ContentProcessing,
    EmailNotification, VideoDraft,
};
