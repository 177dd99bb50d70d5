use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::generation::Generation;

/// Result of a read. `body` is `None` when the object does not exist, in
/// which case `generation` is [`Generation::ABSENT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutput {
    pub body: Option<Vec<u8>>,
    pub generation: Generation,
}

impl ReadOutput {
    pub fn absent() -> Self {
        Self {
            body: None,
            generation: Generation::ABSENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedUrlMethod {
    Get,
    Put,
}

/// Byte-level object storage with generation-conditioned writes.
///
/// Callers own all merge logic; the store only ever replaces whole objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object. A missing object is not an error.
    async fn read(&self, key: &str) -> Result<ReadOutput, StorageError>;

    /// Replace an object if its current generation equals `expected`.
    ///
    /// `Generation::ABSENT` means "create only if missing". Returns the new
    /// generation, or [`StorageError::PreconditionFailed`] if another writer
    /// got there first.
    async fn write(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
        expected: Generation,
    ) -> Result<Generation, StorageError>;

    /// Issue a time-limited URL for direct blob access.
    async fn signed_url(
        &self,
        key: &str,
        method: SignedUrlMethod,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Release client resources. Safe to call more than once.
    async fn close(&self) -> Result<(), StorageError>;
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    async fn read(&self, key: &str) -> Result<ReadOutput, StorageError> {
        (**self).read(key).await
    }

    async fn write(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
        expected: Generation,
    ) -> Result<Generation, StorageError> {
        (**self).write(key, content_type, body, expected).await
    }

    async fn signed_url(
        &self,
        key: &str,
        method: SignedUrlMethod,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        (**self).signed_url(key, method, ttl).await
    }

    async fn close(&self) -> Result<(), StorageError> {
        (**self).close().await
    }
}
