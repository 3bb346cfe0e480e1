//! Registry configuration.

use std::time::Duration;

/// Job registry configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Redis URL
    pub redis_url: String,
    /// How long completed/failed jobs stay readable
    pub retention: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            retention: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl RegistryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            retention: Duration::from_secs(
                std::env::var("JOB_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }
}
