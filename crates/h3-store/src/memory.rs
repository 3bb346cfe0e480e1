//! In-memory guest store.
//!
//! State lives only as long as the process; use it for development and
//! tests, or behind a single API instance. Sessions idle longer than the
//! TTL are treated as unknown and swept once the map grows large.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use h3_models::{GuestSessionId, GuestViewingLimit};

use crate::config::GuestConfig;
use crate::error::StoreResult;
use crate::store::GuestSessionStore;

/// Session count above which a write sweeps idle sessions.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug)]
pub struct MemoryGuestStore {
    sessions: RwLock<HashMap<GuestSessionId, GuestViewingLimit>>,
    session_ttl: chrono::Duration,
}

impl MemoryGuestStore {
    pub fn new() -> Self {
        Self::with_ttl(GuestConfig::default().session_ttl)
    }

    /// Sessions expire `session_ttl` after their last view.
    pub fn with_ttl(session_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_ttl: chrono::Duration::from_std(session_ttl)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    fn is_expired(&self, record: &GuestViewingLimit, now: DateTime<Utc>) -> bool {
        record
            .last_viewed_at
            .checked_add_signed(self.session_ttl)
            .is_some_and(|t| t <= now)
    }

    /// Drop idle sessions. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, r| !self.is_expired(r, now));
        before - sessions.len()
    }

    /// Number of stored sessions, including idle ones not yet swept.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for MemoryGuestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GuestSessionStore for MemoryGuestStore {
    async fn record_view(&self, session_id: &GuestSessionId) -> StoreResult<GuestViewingLimit> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= SWEEP_THRESHOLD {
            let before = sessions.len();
            sessions.retain(|_, r| !self.is_expired(r, now));
            debug!("Swept {} idle guest sessions", before - sessions.len());
        }

        let record = match sessions.get_mut(session_id) {
            Some(record) if !self.is_expired(record, now) => {
                record.record_view();
                record.clone()
            }
            _ => {
                let record = GuestViewingLimit::first_view(session_id.clone());
                sessions.insert(session_id.clone(), record.clone());
                record
            }
        };
        Ok(record)
    }

    async fn lookup(&self, session_id: &GuestSessionId) -> StoreResult<Option<GuestViewingLimit>> {
        let now = Utc::now();
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .filter(|r| !self.is_expired(r, now))
            .cloned())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_record_and_lookup() {
        let store = MemoryGuestStore::new();
        let id = GuestSessionId::parse("guest_abc123").unwrap();

        assert!(store.lookup(&id).await.unwrap().is_none());
        assert_eq!(store.record_view(&id).await.unwrap().view_count, 1);
        assert_eq!(store.record_view(&id).await.unwrap().view_count, 2);
        assert_eq!(store.lookup(&id).await.unwrap().unwrap().view_count, 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_views_are_all_counted() {
        let store = Arc::new(MemoryGuestStore::new());
        let id = GuestSessionId::parse("guest_concurrent").unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = id.clone();
                tokio::spawn(async move { store.record_view(&id).await.unwrap() })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.lookup(&id).await.unwrap().unwrap().view_count, 32);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = MemoryGuestStore::with_ttl(Duration::ZERO);
        let id = GuestSessionId::parse("guest_idle").unwrap();

        assert_eq!(store.record_view(&id).await.unwrap().view_count, 1);
        assert!(store.lookup(&id).await.unwrap().is_none());
        // An expired session starts counting again.
        assert_eq!(store.record_view(&id).await.unwrap().view_count, 1);

        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_active_sessions_survive_purge() {
        let store = MemoryGuestStore::with_ttl(Duration::from_secs(3600));
        let id = GuestSessionId::parse("guest_active").unwrap();
        store.record_view(&id).await.unwrap();

        assert_eq!(store.purge_expired().await, 0);
        assert_eq!(store.len().await, 1);
    }
}
