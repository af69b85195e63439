//! # blob_gateway - Content-Addressed Blob Storage Gateway
//!
//! Clients submit files; the gateway deduplicates them against previously
//! stored content, places accepted blobs across 1024 shard containers and
//! returns a URL per file.
//!
//! ## Architecture Layers
//!
//! - **Domain**: references, sharding, resources, domain errors
//! - **Application**: ports, use cases, the lifecycle pipeline, the result encoder
//! - **Infrastructure**: filesystem container backend, sharded store, HTTP client
//! - **API**: HTTP handlers and router of the blob server
//!
//! ## Example Usage
//!
//! ```no_run
//! use blob_gateway::{application::use_cases::SyncFilesUseCase, infrastructure::http::HttpBlobService};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = HttpBlobService::new("http://localhost:6064/v1/api/blobserver", Duration::from_secs(30))?;
//! let sync = SyncFilesUseCase::connect(Arc::new(service)).await?;
//! let _resources = sync.execute(&["a.txt".into()]).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export key types explicitly to avoid ambiguity
pub use api::errors as api_errors;
pub use application::{dto, ports, use_cases};
pub use config::{ClientConfig, Config};
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
