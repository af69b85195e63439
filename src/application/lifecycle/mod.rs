//! Shard container lifecycle pipeline.
//!
//! Every shard container is driven through a fixed sequence of stages
//! (create, verify read ACL, delete), each stage running its own pool of
//! workers connected by bounded queues.

pub mod config;
pub mod pipeline;
pub mod results;
pub mod stages;

pub use config::PipelineConfig;
pub use pipeline::{LifecycleError, LifecyclePipeline};
pub use results::{LifecycleReport, StageFailure};
pub use stages::{CreateContainer, DeleteContainer, LifecycleStage, StageError, VerifyReadAcl};
