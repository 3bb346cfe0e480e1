//! Guest tracking configuration.

use std::time::Duration;

use h3_models::GUEST_VIEW_LIMIT;

/// Guest view-limit configuration.
#[derive(Debug, Clone)]
pub struct GuestConfig {
    /// Free views before the limit is reached
    pub view_limit: u32,
    /// Answer permissively when the store is down instead of erroring
    pub fail_open: bool,
    /// Idle lifetime of a guest record in the store
    pub session_ttl: Duration,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            view_limit: GUEST_VIEW_LIMIT,
            fail_open: true,
            session_ttl: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
        }
    }
}

impl GuestConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            view_limit: std::env::var("GUEST_VIEW_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v: &u32| *v >= 1)
                .unwrap_or(GUEST_VIEW_LIMIT),
            fail_open: std::env::var("GUEST_FAIL_OPEN")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            session_ttl: Duration::from_secs(
                std::env::var("GUEST_SESSION_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30 * 24 * 60 * 60),
            ),
        }
    }
}
