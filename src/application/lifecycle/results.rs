use std::time::Duration;

/// Outcome of a pipeline run that finished without a stage failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    /// Containers that passed through every stage.
    pub completed: usize,
    pub elapsed: Duration,
}

impl LifecycleReport {
    pub fn new(completed: usize, elapsed: Duration) -> Self {
        Self { completed, elapsed }
    }
}

/// A container that failed in one stage. The container is dropped from
/// the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: &'static str,
    pub container: String,
    pub message: String,
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed for {}: {}", self.stage, self.container, self.message)
    }
}
