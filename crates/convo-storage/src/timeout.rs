//! Deadline decorator for any [`ObjectStore`].
//!
//! Each call runs under `min(now + budget, caller deadline)`. On expiry the
//! inner future is dropped, which cancels the in-flight request, and the
//! call fails with [`StorageError::Timeout`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::warn;

use crate::error::StorageError;
use crate::generation::Generation;
use crate::store::{ObjectStore, ReadOutput, SignedUrlMethod};

/// Default per-operation budget. Kept well under typical end-to-end reply
/// latency so a slow bucket cannot dominate a request.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TimeoutStore<S: ?Sized> {
    inner: Arc<S>,
    budget: Duration,
    deadline: Option<Instant>,
}

impl<S: ?Sized> Clone for TimeoutStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            budget: self.budget,
            deadline: self.deadline,
        }
    }
}

impl<S: ObjectStore> TimeoutStore<S> {
    pub fn new(inner: S, budget: Duration) -> Self {
        Self::from_shared(Arc::new(inner), budget)
    }
}

impl<S: ObjectStore + ?Sized> TimeoutStore<S> {
    pub fn from_shared(inner: Arc<S>, budget: Duration) -> Self {
        Self {
            inner,
            budget,
            deadline: None,
        }
    }

    /// A view of the same store that also honours a caller deadline.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    fn effective_deadline(&self) -> Instant {
        let budgeted = Instant::now() + self.budget;
        match self.deadline {
            Some(caller) => budgeted.min(caller),
            None => budgeted,
        }
    }

    async fn bounded<T, F>(&self, op: &'static str, key: &str, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        let started = Instant::now();
        let deadline = self.effective_deadline();
        match tokio::time::timeout_at(deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                let limit = deadline.saturating_duration_since(started);
                warn!(
                    op,
                    key,
                    budget_ms = self.budget.as_millis() as u64,
                    limit_ms = limit.as_millis() as u64,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "storage operation timed out"
                );
                Err(StorageError::Timeout {
                    op,
                    key: key.to_string(),
                    limit,
                })
            }
        }
    }
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for TimeoutStore<S> {
    async fn read(&self, key: &str) -> Result<ReadOutput, StorageError> {
        self.bounded("read", key, self.inner.read(key)).await
    }

    async fn write(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
        expected: Generation,
    ) -> Result<Generation, StorageError> {
        self.bounded("write", key, self.inner.write(key, content_type, body, expected))
            .await
    }

    async fn signed_url(
        &self,
        key: &str,
        method: SignedUrlMethod,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        self.bounded("signed_url", key, self.inner.signed_url(key, method, ttl))
            .await
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.bounded("close", "", self.inner.close()).await
    }
}
