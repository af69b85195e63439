use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::application::ports::{header, ObjectBackend, ObjectHeaders, StorageError, CONTAINER_READ};

#[derive(Debug, Error)]
pub enum StageError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Wrong read ACL: expected {expected:?}, got {actual:?}")]
    AclMismatch {
        expected: String,
        actual: Option<String>,
    },
}

/// One step applied to every container passing through the pipeline.
///
/// ```rust,ignore
/// struct Touch;
///
/// #[async_trait]
/// impl LifecycleStage for Touch {
///     fn name(&self) -> &'static str {
///         "touch"
///     }
///
///     async fn apply(&self, container: &str) -> Result<(), StageError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait LifecycleStage: Send + Sync {
    /// Stage name used in logs and failure reports.
    fn name(&self) -> &'static str;

    async fn apply(&self, container: &str) -> Result<(), StageError>;
}

/// Creates the container with the given read ACL.
pub struct CreateContainer {
    backend: Arc<dyn ObjectBackend>,
    read_acl: String,
}

impl CreateContainer {
    pub fn new(backend: Arc<dyn ObjectBackend>, read_acl: impl Into<String>) -> Self {
        Self {
            backend,
            read_acl: read_acl.into(),
        }
    }
}

#[async_trait]
impl LifecycleStage for CreateContainer {
    fn name(&self) -> &'static str {
        "create"
    }

    async fn apply(&self, container: &str) -> Result<(), StageError> {
        let mut headers = ObjectHeaders::new();
        headers.insert(CONTAINER_READ.to_string(), self.read_acl.clone());
        self.backend.container_create(container, headers).await?;
        debug!(container, "Created container");
        Ok(())
    }
}

/// Checks the container's read ACL equals the expected policy.
pub struct VerifyReadAcl {
    backend: Arc<dyn ObjectBackend>,
    expected: String,
}

impl VerifyReadAcl {
    pub fn new(backend: Arc<dyn ObjectBackend>, expected: impl Into<String>) -> Self {
        Self {
            backend,
            expected: expected.into(),
        }
    }
}

#[async_trait]
impl LifecycleStage for VerifyReadAcl {
    fn name(&self) -> &'static str {
        "verify"
    }

    async fn apply(&self, container: &str) -> Result<(), StageError> {
        let headers = self.backend.container_headers(container).await?;
        let actual = header(&headers, CONTAINER_READ);
        if actual != Some(self.expected.as_str()) {
            return Err(StageError::AclMismatch {
                expected: self.expected.clone(),
                actual: actual.map(str::to_string),
            });
        }
        Ok(())
    }
}

pub struct DeleteContainer {
    backend: Arc<dyn ObjectBackend>,
}

impl DeleteContainer {
    pub fn new(backend: Arc<dyn ObjectBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl LifecycleStage for DeleteContainer {
    fn name(&self) -> &'static str {
        "delete"
    }

    async fn apply(&self, container: &str) -> Result<(), StageError> {
        self.backend.container_delete(container).await?;
        debug!(container, "Deleted container");
        Ok(())
    }
}
