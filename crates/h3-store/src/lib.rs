//! Guest session storage.
//!
//! This crate provides:
//! - The `GuestSessionStore` repository trait
//! - Redis-backed store using atomic hash increments
//! - In-memory store for development and tests
//! - `GuestViewTracker`, the view-limit policy on top of a store

pub mod config;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod redis_store;
pub mod store;
pub mod tracker;

pub use config::GuestConfig;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryGuestStore;
pub use redis_store::RedisGuestStore;
pub use store::GuestSessionStore;
pub use tracker::{GuestViewTracker, TrackOutcome};
