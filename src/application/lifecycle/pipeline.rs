use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::config::PipelineConfig;
use super::results::{LifecycleReport, StageFailure};
use super::stages::{CreateContainer, DeleteContainer, LifecycleStage, VerifyReadAcl};
use crate::application::ports::ObjectBackend;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Stage(StageFailure),

    #[error("Pipeline stopped after {completed} of {expected} containers")]
    Incomplete { completed: usize, expected: usize },

    #[error("Worker task failed: {0}")]
    Join(String),
}

/// Drives containers through a chain of stages.
///
/// Each stage owns `workers_per_stage` tasks sharing one bounded input
/// queue; a container moves to the next queue only after the stage
/// succeeded for it, so per-container ordering follows the stage order.
/// A failure is reported on a shared error channel and the container is
/// dropped. The first failure ends the run; work already in flight is left
/// to finish in the background.
///
/// # Examples
///
/// ```rust,ignore
/// let pipeline = LifecyclePipeline::standard(backend, ".r:*,.rlistings", PipelineConfig::default());
/// let report = pipeline.run(store.container_names()).await?;
/// assert_eq!(report.completed, 1024);
/// ```
pub struct LifecyclePipeline {
    stages: Vec<Arc<dyn LifecycleStage>>,
    config: PipelineConfig,
}

impl LifecyclePipeline {
    pub fn new(stages: Vec<Arc<dyn LifecycleStage>>, config: PipelineConfig) -> Self {
        Self { stages, config }
    }

    /// create -> verify read ACL -> delete
    pub fn standard(
        backend: Arc<dyn ObjectBackend>,
        read_acl: &str,
        config: PipelineConfig,
    ) -> Self {
        let stages: Vec<Arc<dyn LifecycleStage>> = vec![
            Arc::new(CreateContainer::new(Arc::clone(&backend), read_acl)),
            Arc::new(VerifyReadAcl::new(Arc::clone(&backend), read_acl)),
            Arc::new(DeleteContainer::new(backend)),
        ];
        Self::new(stages, config)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every container through all stages.
    pub async fn run(&self, containers: Vec<String>) -> Result<LifecycleReport, LifecycleError> {
        let started = Instant::now();
        let expected = containers.len();
        if expected == 0 {
            return Ok(LifecycleReport::new(0, started.elapsed()));
        }

        info!(
            containers = expected,
            stages = ?self.stage_names(),
            workers_per_stage = self.config.workers_per_stage,
            "Starting lifecycle pipeline"
        );

        let capacity = self.config.queue_capacity;
        let (error_tx, mut error_rx) = mpsc::channel::<StageFailure>(capacity);
        let (input_tx, mut queue) = mpsc::channel::<String>(capacity);
        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        handles.push(tokio::spawn(async move {
            for container in containers {
                if input_tx.send(container).await.is_err() {
                    break;
                }
            }
        }));

        for stage in &self.stages {
            let (output_tx, output_rx) = mpsc::channel::<String>(capacity);
            let input = Arc::new(Mutex::new(queue));
            for _ in 0..self.config.workers_per_stage {
                handles.push(tokio::spawn(stage_worker(
                    Arc::clone(stage),
                    Arc::clone(&input),
                    output_tx.clone(),
                    error_tx.clone(),
                )));
            }
            queue = output_rx;
        }
        drop(error_tx);

        let mut completed = 0;
        while completed < expected {
            tokio::select! {
                biased;
                Some(failure) = error_rx.recv() => {
                    error!(stage = failure.stage, container = %failure.container, error = %failure.message, "Lifecycle stage failed");
                    return Err(LifecycleError::Stage(failure));
                }
                item = queue.recv() => match item {
                    Some(container) => {
                        completed += 1;
                        debug!(container = %container, completed, "Container finished lifecycle");
                    }
                    None => {
                        if let Ok(failure) = error_rx.try_recv() {
                            return Err(LifecycleError::Stage(failure));
                        }
                        return Err(LifecycleError::Incomplete { completed, expected });
                    }
                },
            }
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| LifecycleError::Join(e.to_string()))?;
        }

        let report = LifecycleReport::new(completed, started.elapsed());
        info!(completed, elapsed = ?report.elapsed, "Lifecycle pipeline finished");
        Ok(report)
    }
}

async fn stage_worker(
    stage: Arc<dyn LifecycleStage>,
    input: Arc<Mutex<mpsc::Receiver<String>>>,
    output: mpsc::Sender<String>,
    errors: mpsc::Sender<StageFailure>,
) {
    loop {
        let next = input.lock().await.recv().await;
        let Some(container) = next else {
            break;
        };

        match stage.apply(&container).await {
            Ok(()) => {
                if output.send(container).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                let failure = StageFailure {
                    stage: stage.name(),
                    container,
                    message: e.to_string(),
                };
                if errors.send(failure).await.is_err() {
                    break;
                }
            }
        }
    }
}
