/// Default number of workers per stage.
pub const DEFAULT_WORKERS_PER_STAGE: usize = 64;

/// Default capacity of each queue between stages.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration for the lifecycle pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Worker tasks sharing each stage's input queue
    pub workers_per_stage: usize,
    /// Capacity of every inter-stage queue
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers_per_stage: DEFAULT_WORKERS_PER_STAGE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Zero values are raised to one so the pipeline always makes progress.
    pub fn new(workers_per_stage: usize, queue_capacity: usize) -> Self {
        Self {
            workers_per_stage: workers_per_stage.max(1),
            queue_capacity: queue_capacity.max(1),
        }
    }
}
