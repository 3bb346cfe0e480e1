//! Guest viewing sessions.
//!
//! Anonymous visitors are identified by an opaque session id carried in a
//! cookie. Each tracked view bumps a counter; once the counter passes the
//! limit the client is asked to show a login prompt.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::{is_safe_identifier, random_base36};

/// Number of free views a guest gets before the limit is reached.
pub const GUEST_VIEW_LIMIT: u32 = 2;

/// Lifetime of the session cookie issued to new guests (30 days).
pub const SESSION_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

const SESSION_ID_MAX_LEN: usize = 128;

/// Rejected client-supplied session id.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid session id: {0}")]
pub struct InvalidSessionId(pub String);

/// Opaque identifier of an anonymous browser session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GuestSessionId(String);

impl GuestSessionId {
    /// Generate a fresh session id: `guest_` + 9 base-36 chars + unix millis.
    pub fn generate() -> Self {
        Self(format!(
            "guest_{}{}",
            random_base36(9),
            Utc::now().timestamp_millis()
        ))
    }

    /// Parse a client-supplied session id.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidSessionId> {
        let raw = raw.into();
        if is_safe_identifier(&raw, SESSION_ID_MAX_LEN) {
            Ok(Self(raw))
        } else {
            Err(InvalidSessionId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuestSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted view counter for one guest session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestViewingLimit {
    pub session_id: GuestSessionId,
    /// Number of tracked views, starts at 1 on the first view
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_viewed_at: DateTime<Utc>,
}

impl GuestViewingLimit {
    /// Record for a session seen for the first time.
    pub fn first_view(session_id: GuestSessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            view_count: 1,
            created_at: now,
            last_viewed_at: now,
        }
    }

    /// Count one more view.
    pub fn record_view(&mut self) {
        self.view_count = self.view_count.saturating_add(1);
        self.last_viewed_at = Utc::now();
    }
}

/// Outcome of evaluating a view count against the guest limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewDecision {
    pub view_count: u64,
    /// `view_count > limit`
    pub limit_reached: bool,
    /// `max(0, limit - view_count + 1)`
    pub remaining_views: u64,
    /// `view_count >= limit`
    pub show_login_prompt: bool,
}

impl ViewDecision {
    /// Evaluate a view count against `limit`.
    pub fn evaluate(view_count: u64, limit: u32) -> Self {
        let limit = u64::from(limit);
        Self {
            view_count,
            limit_reached: view_count > limit,
            remaining_views: (limit + 1).saturating_sub(view_count),
            show_login_prompt: view_count >= limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_view_allows_access() {
        let d = ViewDecision::evaluate(1, GUEST_VIEW_LIMIT);
        assert_eq!(d.view_count, 1);
        assert!(!d.limit_reached);
        assert!(!d.show_login_prompt);
        assert_eq!(d.remaining_views, 2);
    }

    #[test]
    fn test_second_view_prompts_login() {
        let d = ViewDecision::evaluate(2, GUEST_VIEW_LIMIT);
        assert!(!d.limit_reached);
        assert!(d.show_login_prompt);
        assert_eq!(d.remaining_views, 1);
    }

    #[test]
    fn test_third_view_reaches_limit() {
        let d = ViewDecision::evaluate(3, GUEST_VIEW_LIMIT);
        assert!(d.limit_reached);
        assert!(d.show_login_prompt);
        assert_eq!(d.remaining_views, 0);
    }

    #[test]
    fn test_remaining_views_never_underflows() {
        for count in 0..50 {
            let d = ViewDecision::evaluate(count, GUEST_VIEW_LIMIT);
            assert!(d.remaining_views <= u64::from(GUEST_VIEW_LIMIT) + 1);
        }
        let d = ViewDecision::evaluate(u64::MAX, GUEST_VIEW_LIMIT);
        assert_eq!(d.remaining_views, 0);
    }

    #[test]
    fn test_decision_wire_format() {
        let json = serde_json::to_value(ViewDecision::evaluate(3, 2)).unwrap();
        assert_eq!(json["viewCount"], 3);
        assert_eq!(json["limitReached"], true);
        assert_eq!(json["remainingViews"], 0);
        assert_eq!(json["showLoginPrompt"], true);
    }

    #[test]
    fn test_generated_session_id() {
        let id = GuestSessionId::generate();
        assert!(id.as_str().starts_with("guest_"));
        // prefix + 9 random chars + 13 digit millis
        assert!(id.as_str().len() >= 6 + 9 + 13);
        assert!(GuestSessionId::parse(id.as_str()).is_ok());
        assert_ne!(id, GuestSessionId::generate());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(GuestSessionId::parse("guest_abc123").is_ok());
        assert!(GuestSessionId::parse("").is_err());
        assert!(GuestSessionId::parse("a b").is_err());
        assert!(GuestSessionId::parse("x".repeat(200)).is_err());
    }

    #[test]
    fn test_record_view_increments() {
        let mut limit = GuestViewingLimit::first_view(GuestSessionId::generate());
        assert_eq!(limit.view_count, 1);
        limit.record_view();
        limit.record_view();
        assert_eq!(limit.view_count, 3);
        assert!(limit.last_viewed_at >= limit.created_at);
    }
}
