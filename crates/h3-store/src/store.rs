//! Guest session repository trait.

use async_trait::async_trait;

use h3_models::{GuestSessionId, GuestViewingLimit};

use crate::error::StoreResult;

/// Persistence for guest view counters.
///
/// Implementations must make `record_view` a single atomic
/// increment-or-create so concurrent views of one session are not lost.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuestSessionStore: Send + Sync {
    /// Count a view, creating the record with `view_count = 1` if absent.
    async fn record_view(&self, session_id: &GuestSessionId) -> StoreResult<GuestViewingLimit>;

    /// Read a session without counting a view.
    async fn lookup(&self, session_id: &GuestSessionId) -> StoreResult<Option<GuestViewingLimit>>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}
