//! Standalone job worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use h3_queue::RedisJobRegistry;
use h3_worker::{default_processors, JobExecutor, LoggingContentSink, WorkerConfig};

#[tokio::main]
async fn main() {
    // Needed for rediss:// connections
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,h3_worker=info,h3_queue=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting h3-worker");

    if std::env::var("STORE_BACKEND").is_ok_and(|v| v.eq_ignore_ascii_case("memory")) {
        error!("STORE_BACKEND=memory cannot be shared with a separate worker; use EMBEDDED_WORKER in the API instead");
        std::process::exit(1);
    }

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let registry = match RedisJobRegistry::from_env() {
        Ok(r) => Arc::new(r),
        Err(e) => {
            error!("Failed to create job registry: {}", e);
            std::process::exit(1);
        }
    };

    let processors = default_processors(Arc::new(LoggingContentSink), &config);
    let executor = Arc::new(JobExecutor::new(config, registry, processors));

    let shutdown_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_executor.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
