//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use h3_api::{create_router, metrics, ApiConfig, AppState};
use h3_worker::{default_processors, JobExecutor, LoggingContentSink, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Needed for rediss:// connections
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,h3_api=info,h3_store=info,h3_queue=info"));

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

    info!("Starting h3-api");

    let config = ApiConfig::from_env();
    info!(
        "API config: host={}, port={}, store={:?}, embedded_worker={}",
        config.host, config.port, config.store_backend, config.embedded_worker
    );
    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET is not set; job submission and stats will answer 401");
    }

    let state = match AppState::new(config.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create application state: {}", e);
            std::process::exit(1);
        }
    };

    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let metrics_handle = if metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    let executor = config.embedded_worker.then(|| {
        let worker_config = WorkerConfig::from_env();
        let processors = default_processors(Arc::new(LoggingContentSink), &worker_config);
        Arc::new(JobExecutor::new(
            worker_config,
            Arc::clone(state.queue.registry()),
            processors,
        ))
    });

    let executor_task = executor.as_ref().map(|executor| {
        info!("Running embedded job executor");
        let executor = Arc::clone(executor);
        tokio::spawn(async move {
            if let Err(e) = executor.run().await {
                error!("Executor error: {}", e);
            }
        })
    });

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address: {}", e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", addr);

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;
    if let Err(e) = served {
        error!("Server error: {}", e);
    }

    if let (Some(executor), Some(task)) = (executor, executor_task) {
        executor.shutdown();
        let _ = task.await;
    }

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
