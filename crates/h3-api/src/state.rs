//! Application state.

use std::sync::Arc;

use h3_queue::{JobQueue, JobRegistry, MemoryJobRegistry, RedisJobRegistry, RegistryConfig};
use h3_store::{GuestConfig, GuestSessionStore, GuestViewTracker, MemoryGuestStore, RedisGuestStore};

use crate::auth::JwtVerifier;
use crate::config::{ApiConfig, StoreBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub tracker: GuestViewTracker,
    pub queue: JobQueue,
    pub jwt: Option<Arc<JwtVerifier>>,
}

impl AppState {
    /// Create application state with the backends named in `config`.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let guest_config = GuestConfig::from_env();
        let registry_config = RegistryConfig::from_env();

        let (guest_store, registry): (Arc<dyn GuestSessionStore>, Arc<dyn JobRegistry>) =
            match config.store_backend {
                StoreBackend::Redis => (
                    Arc::new(RedisGuestStore::new(
                        &registry_config.redis_url,
                        guest_config.session_ttl,
                    )?),
                    Arc::new(RedisJobRegistry::new(registry_config)?),
                ),
                StoreBackend::Memory => (
                    Arc::new(MemoryGuestStore::with_ttl(guest_config.session_ttl)),
                    Arc::new(MemoryJobRegistry::new(registry_config.retention)),
                ),
            };

        Ok(Self::with_backends(config, guest_store, guest_config, registry))
    }

    /// Assemble state around already-built stores.
    pub fn with_backends(
        config: ApiConfig,
        guest_store: Arc<dyn GuestSessionStore>,
        guest_config: GuestConfig,
        registry: Arc<dyn JobRegistry>,
    ) -> Self {
        let jwt = config
            .jwt_secret
            .as_deref()
            .map(|secret| Arc::new(JwtVerifier::new(secret)));

        Self {
            tracker: GuestViewTracker::new(guest_store, guest_config),
            queue: JobQueue::new(registry),
            jwt,
            config,
        }
    }
}
