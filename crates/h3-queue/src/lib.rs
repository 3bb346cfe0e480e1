//! Job status registry.
//!
//! This crate provides:
//! - The `JobRegistry` repository trait, keyed by job id
//! - Redis-backed registry (JSON records plus ready/delayed sorted sets)
//! - In-memory registry for development and tests
//! - `JobQueue`, the submission facade used by the API

pub mod config;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod queue;
pub mod redis_registry;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{QueueError, QueueResult};
pub use memory::MemoryJobRegistry;
pub use queue::JobQueue;
pub use redis_registry::RedisJobRegistry;
pub use registry::{JobRegistry, QueueStats};
