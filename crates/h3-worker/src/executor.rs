//! Job executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};

use h3_models::{FailureOutcome, Job};
use h3_queue::{metrics, JobRegistry};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::processor::ProcessorRegistry;

/// Runs one claimed job and writes its next state back to the registry.
#[derive(Clone)]
pub struct JobRunner {
    registry: Arc<dyn JobRegistry>,
    processors: Arc<ProcessorRegistry>,
    job_timeout: Duration,
}

impl JobRunner {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        processors: ProcessorRegistry,
        job_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            processors: Arc::new(processors),
            job_timeout,
        }
    }

    /// Process a job in `processing` and persist the outcome.
    ///
    /// Transient errors re-queue the job with backoff while attempts remain.
    /// Permanent errors fail it at once.
    pub async fn run(&self, mut job: Job) -> WorkerResult<Job> {
        let logger = JobLogger::new(&job);
        logger.log_start();
        let started = Instant::now();

        let result = match self.processors.get(job.job_type) {
            Some(processor) => {
                match tokio::time::timeout(self.job_timeout, processor.process(&job)).await {
                    Ok(result) => result,
                    Err(_) => Err(WorkerError::Timeout(self.job_timeout)),
                }
            }
            None => Err(WorkerError::NoProcessor(job.job_type)),
        };

        let job_type = job.job_type.as_str();
        match result {
            Ok(()) => {
                job.complete()?;
                logger.log_completion(started.elapsed());
                metrics::record_job_completed(job_type);
            }
            Err(e) if e.is_permanent_failure() => {
                let message = e.to_string();
                job.fail(message.as_str())?;
                logger.log_failed(&message);
                metrics::record_job_failed(job_type);
            }
            Err(e) => {
                let message = e.to_string();
                match job.record_failure(message.as_str())? {
                    FailureOutcome::Retry { delay } => {
                        logger.log_retry(&message, delay);
                        metrics::record_job_retried(job_type);
                    }
                    FailureOutcome::Failed => {
                        logger.log_failed(&message);
                        metrics::record_job_failed(job_type);
                    }
                }
            }
        }

        self.registry.save(&job).await?;
        Ok(job)
    }
}

/// Job executor that claims ready jobs from the registry.
pub struct JobExecutor {
    config: WorkerConfig,
    registry: Arc<dyn JobRegistry>,
    runner: JobRunner,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

impl JobExecutor {
    pub fn new(
        config: WorkerConfig,
        registry: Arc<dyn JobRegistry>,
        processors: ProcessorRegistry,
    ) -> Self {
        let runner = JobRunner::new(Arc::clone(&registry), processors, config.job_timeout);
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            registry,
            runner,
            job_semaphore,
            shutdown,
        }
    }

    /// Poll until shutdown is signalled, then drain in-flight jobs.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor with {} max concurrent jobs",
            self.config.max_concurrent_jobs
        );

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut purge = tokio::time::interval(self.config.purge_interval);
        purge.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        while !*shutdown_rx.borrow() {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = poll.tick() => {
                    if let Err(e) = self.dispatch_ready().await {
                        error!("Error claiming jobs: {}", e);
                    }
                }
                _ = purge.tick() => {
                    match self.registry.purge_expired().await {
                        Ok(0) => {}
                        Ok(n) => debug!("Purged {} expired jobs", n),
                        Err(e) => warn!("Failed to purge expired jobs: {}", e),
                    }
                }
            }
        }
        info!("Shutdown signal received, stopping executor");

        info!("Waiting for in-flight jobs to complete...");
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "Shutdown timeout of {:?} elapsed with jobs still running",
                self.config.shutdown_timeout
            );
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Claim jobs into every free slot. Returns how many were started.
    pub async fn dispatch_ready(&self) -> WorkerResult<usize> {
        let mut dispatched = 0;

        while let Ok(permit) = Arc::clone(&self.job_semaphore).try_acquire_owned() {
            let Some(job) = self.registry.claim_next().await? else {
                break;
            };

            let runner = self.runner.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let job_id = job.id.clone();
                if let Err(e) = runner.run(job).await {
                    error!(job_id = %job_id, "Failed to record job outcome: {}", e);
                }
            });
            dispatched += 1;
        }

        if dispatched > 0 {
            debug!("Dispatched {} jobs", dispatched);
        }
        Ok(dispatched)
    }

    /// Jobs currently running.
    pub fn in_flight(&self) -> usize {
        self.config.max_concurrent_jobs - self.job_semaphore.available_permits()
    }

    async fn wait_for_jobs(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
