//! Redis-backed guest store.
//!
//! Each session is a hash at `h3:guest:{id}` with `view_count`,
//! `created_at` and `last_viewed_at`. Views are counted with `HINCRBY`
//! inside a MULTI block, so concurrent requests never lose an increment.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use h3_models::{GuestSessionId, GuestViewingLimit};

use crate::error::{StoreError, StoreResult};
use crate::store::GuestSessionStore;

const KEY_PREFIX: &str = "h3:guest:";

pub struct RedisGuestStore {
    client: redis::Client,
    session_ttl: Duration,
}

impl RedisGuestStore {
    /// Create a store; no connection is made until the first command.
    pub fn new(redis_url: &str, session_ttl: Duration) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            session_ttl,
        })
    }

    fn key(session_id: &GuestSessionId) -> String {
        format!("{}{}", KEY_PREFIX, session_id)
    }

    /// `EXPIRE 0` deletes the key, so the TTL never drops below a second.
    fn expire_secs(&self) -> i64 {
        self.session_ttl.as_secs().clamp(1, i64::MAX as u64) as i64
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))
    }
}

fn parse_timestamp(key: &str, field: &str, raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(key, format!("{}: {}", field, e)))
}

#[async_trait]
impl GuestSessionStore for RedisGuestStore {
    async fn record_view(&self, session_id: &GuestSessionId) -> StoreResult<GuestViewingLimit> {
        let mut conn = self.connection().await?;
        let key = Self::key(session_id);
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        let (view_count, created_at): (u64, String) = redis::pipe()
            .atomic()
            .hincr(&key, "view_count", 1)
            .hset_nx(&key, "created_at", &now_str)
            .ignore()
            .hset(&key, "last_viewed_at", &now_str)
            .ignore()
            .expire(&key, self.expire_secs())
            .ignore()
            .hget(&key, "created_at")
            .query_async(&mut conn)
            .await?;

        debug!(session_id = %session_id, view_count, "Recorded guest view");

        Ok(GuestViewingLimit {
            session_id: session_id.clone(),
            view_count,
            created_at: parse_timestamp(&key, "created_at", &created_at)?,
            last_viewed_at: now,
        })
    }

    async fn lookup(&self, session_id: &GuestSessionId) -> StoreResult<Option<GuestViewingLimit>> {
        let mut conn = self.connection().await?;
        let key = Self::key(session_id);

        let fields: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(&key)
            .query_async(&mut conn)
            .await?;
        if fields.is_empty() {
            return Ok(None);
        }

        let field = |name: &str| {
            fields
                .get(name)
                .ok_or_else(|| StoreError::corrupt(&key, format!("missing {}", name)))
        };

        let view_count = field("view_count")?
            .parse::<u64>()
            .map_err(|e| StoreError::corrupt(&key, format!("view_count: {}", e)))?;
        let created_at = parse_timestamp(&key, "created_at", field("created_at")?)?;
        let last_viewed_at = parse_timestamp(&key, "last_viewed_at", field("last_viewed_at")?)?;

        Ok(Some(GuestViewingLimit {
            session_id: session_id.clone(),
            view_count,
            created_at,
            last_viewed_at,
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let id = GuestSessionId::parse("guest_abc123").unwrap();
        assert_eq!(RedisGuestStore::key(&id), "h3:guest:guest_abc123");
    }

    #[test]
    fn test_zero_ttl_still_expires_later() {
        let store = RedisGuestStore::new("redis://127.0.0.1:6379", Duration::ZERO).unwrap();
        assert_eq!(store.expire_secs(), 1);

        let store =
            RedisGuestStore::new("redis://127.0.0.1:6379", Duration::from_secs(86_400)).unwrap();
        assert_eq!(store.expire_secs(), 86_400);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_redis_round_trip() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        let store = RedisGuestStore::new(&url, Duration::from_secs(60)).unwrap();
        let id = GuestSessionId::generate();

        store.ping().await.unwrap();
        assert!(store.lookup(&id).await.unwrap().is_none());
        assert_eq!(store.record_view(&id).await.unwrap().view_count, 1);
        assert_eq!(store.record_view(&id).await.unwrap().view_count, 2);

        let found = store.lookup(&id).await.unwrap().unwrap();
        assert_eq!(found.view_count, 2);
        assert!(found.last_viewed_at >= found.created_at);
    }
}
