//! Axum HTTP API server.
//!
//! This crate provides:
//! - Guest view tracking with a session cookie
//! - Job submission, status polling and queue statistics
//! - Bearer token verification, rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
