//! Guest view-limit tracking.

use std::sync::Arc;

use tracing::{debug, warn};

use h3_models::{GuestSessionId, ViewDecision};

use crate::config::GuestConfig;
use crate::error::StoreResult;
use crate::metrics;
use crate::store::GuestSessionStore;

/// Result of tracking one guest view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOutcome {
    /// Session the view was counted against
    pub session_id: GuestSessionId,
    /// True when the caller had no session and a new id was generated
    pub issued: bool,
    pub decision: ViewDecision,
    /// True when the store failed and the tracker answered permissively
    pub degraded: bool,
}

/// Counts guest views and decides when to prompt for login.
#[derive(Clone)]
pub struct GuestViewTracker {
    store: Arc<dyn GuestSessionStore>,
    config: GuestConfig,
}

impl GuestViewTracker {
    pub fn new(store: Arc<dyn GuestSessionStore>, config: GuestConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &GuestConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn GuestSessionStore> {
        &self.store
    }

    /// Count a view for `session_id`, generating a session when absent.
    ///
    /// Store failures either propagate or, with `fail_open`, yield a
    /// zero-count decision flagged as `degraded`.
    pub async fn track_view(&self, session_id: Option<GuestSessionId>) -> StoreResult<TrackOutcome> {
        let issued = session_id.is_none();
        let session_id = session_id.unwrap_or_else(GuestSessionId::generate);

        match self.store.record_view(&session_id).await {
            Ok(record) => {
                let decision = ViewDecision::evaluate(record.view_count, self.config.view_limit);
                debug!(
                    session_id = %session_id,
                    view_count = decision.view_count,
                    limit_reached = decision.limit_reached,
                    "Tracked guest view"
                );
                metrics::record_view(
                    issued,
                    decision.show_login_prompt,
                    decision.limit_reached,
                );
                Ok(TrackOutcome {
                    session_id,
                    issued,
                    decision,
                    degraded: false,
                })
            }
            Err(e) if self.config.fail_open => {
                warn!(
                    session_id = %session_id,
                    endpoint = "guest-tracking",
                    error = %e,
                    "Guest store unavailable, failing open"
                );
                metrics::record_store_error("record_view", true);
                Ok(TrackOutcome {
                    session_id,
                    issued,
                    decision: ViewDecision::evaluate(0, self.config.view_limit),
                    degraded: true,
                })
            }
            Err(e) => {
                metrics::record_store_error("record_view", false);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::MemoryGuestStore;
    use crate::store::MockGuestSessionStore;

    fn tracker() -> GuestViewTracker {
        GuestViewTracker::new(Arc::new(MemoryGuestStore::new()), GuestConfig::default())
    }

    fn failing_tracker(fail_open: bool) -> GuestViewTracker {
        let mut store = MockGuestSessionStore::new();
        store
            .expect_record_view()
            .returning(|_| Err(StoreError::unavailable("connection refused")));
        GuestViewTracker::new(
            Arc::new(store),
            GuestConfig {
                fail_open,
                ..GuestConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_three_views_scenario() {
        let tracker = tracker();
        let id = GuestSessionId::parse("guest_abc123").unwrap();

        let first = tracker.track_view(Some(id.clone())).await.unwrap();
        assert_eq!(first.decision.view_count, 1);
        assert!(!first.decision.show_login_prompt);
        assert!(!first.decision.limit_reached);
        assert!(!first.issued);

        let second = tracker.track_view(Some(id.clone())).await.unwrap();
        assert_eq!(second.decision.view_count, 2);
        assert!(second.decision.show_login_prompt);
        assert!(!second.decision.limit_reached);

        let third = tracker.track_view(Some(id.clone())).await.unwrap();
        assert_eq!(
            third.decision,
            ViewDecision {
                view_count: 3,
                limit_reached: true,
                remaining_views: 0,
                show_login_prompt: true,
            }
        );
        assert_eq!(third.session_id, id);
    }

    #[tokio::test]
    async fn test_missing_session_is_issued() {
        let tracker = tracker();
        let outcome = tracker.track_view(None).await.unwrap();
        assert!(outcome.issued);
        assert!(outcome.session_id.as_str().starts_with("guest_"));
        assert_eq!(outcome.decision.view_count, 1);

        // The issued id is stable when the caller sends it back.
        let again = tracker
            .track_view(Some(outcome.session_id.clone()))
            .await
            .unwrap();
        assert_eq!(again.session_id, outcome.session_id);
        assert_eq!(again.decision.view_count, 2);
    }

    #[tokio::test]
    async fn test_custom_limit() {
        let tracker = GuestViewTracker::new(
            Arc::new(MemoryGuestStore::new()),
            GuestConfig {
                view_limit: 5,
                ..GuestConfig::default()
            },
        );
        let id = GuestSessionId::generate();
        for _ in 0..4 {
            tracker.track_view(Some(id.clone())).await.unwrap();
        }
        let fifth = tracker.track_view(Some(id)).await.unwrap();
        assert!(fifth.decision.show_login_prompt);
        assert!(!fifth.decision.limit_reached);
        assert_eq!(fifth.decision.remaining_views, 1);
    }

    #[tokio::test]
    async fn test_fail_open() {
        let outcome = failing_tracker(true).track_view(None).await.unwrap();
        assert!(outcome.degraded);
        assert_eq!(outcome.decision.view_count, 0);
        assert!(!outcome.decision.limit_reached);
        assert!(!outcome.decision.show_login_prompt);
        assert_eq!(outcome.decision.remaining_views, 3);
    }

    #[tokio::test]
    async fn test_fail_closed() {
        let err = failing_tracker(false).track_view(None).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
