//! Background job worker.
//!
//! This crate provides:
//! - `JobExecutor`: polls the registry, runs jobs with bounded concurrency
//! - Retry with backoff and permanent-failure handling
//! - The processor registry and the default processors
//! - Graceful shutdown

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod processor;
pub mod processors;
pub mod sink;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{JobExecutor, JobRunner};
pub use processor::{JobProcessor, ProcessorRegistry};
pub use processors::default_processors;
pub use sink::{ContentSink, LoggingContentSink};
