//! Job processor trait and registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use h3_models::{Job, JobType};

use crate::error::WorkerResult;

/// Runs jobs of one type.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    fn job_type(&self) -> JobType;

    async fn process(&self, job: &Job) -> WorkerResult<()>;
}

/// Processors keyed by the job type they handle.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<JobType, Arc<dyn JobProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor, replacing any previous one for its type.
    pub fn register(&mut self, processor: Arc<dyn JobProcessor>) {
        let job_type = processor.job_type();
        info!(job_type = job_type.as_str(), "Job processor registered");
        self.processors.insert(job_type, processor);
    }

    pub fn get(&self, job_type: JobType) -> Option<Arc<dyn JobProcessor>> {
        self.processors.get(&job_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
