//! In-process [`ObjectStore`] with the same conditional-write rules as the
//! S3 binding. Used by tests and local runs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::generation::Generation;
use crate::store::{ObjectStore, ReadOutput, SignedUrlMethod};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
    generation: Generation,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    latency: Option<Duration>,
    closed: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation by `latency` before it touches state.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Number of `read` calls made so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write` calls made so far, successful or not.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(|o| o.content_type.clone())
    }

    /// Overwrite an object unconditionally, bumping its generation. Lets
    /// tests plant legacy or corrupt data.
    pub fn insert_raw(&self, key: &str, body: impl Into<Vec<u8>>) -> Generation {
        let mut objects = self.lock();
        let generation = objects
            .get(key)
            .map_or(Generation::ABSENT, |o| o.generation)
            .next();
        objects.insert(
            key.to_string(),
            StoredObject {
                body: body.into(),
                content_type: "application/octet-stream".to_string(),
                generation,
            },
        );
        generation
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn simulate_latency(&self) -> Result<(), StorageError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed);
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn read(&self, key: &str) -> Result<ReadOutput, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await?;

        Ok(match self.lock().get(key) {
            Some(object) => ReadOutput {
                body: Some(object.body.clone()),
                generation: object.generation,
            },
            None => ReadOutput::absent(),
        })
    }

    async fn write(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
        expected: Generation,
    ) -> Result<Generation, StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await?;

        let mut objects = self.lock();
        let current = objects.get(key).map_or(Generation::ABSENT, |o| o.generation);
        if current != expected {
            return Err(StorageError::PreconditionFailed {
                key: key.to_string(),
                expected,
            });
        }

        let next = current.next();
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                generation: next,
            },
        );
        Ok(next)
    }

    async fn signed_url(
        &self,
        key: &str,
        method: SignedUrlMethod,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        self.simulate_latency().await?;
        let method = match method {
            SignedUrlMethod::Get => "GET",
            SignedUrlMethod::Put => "PUT",
        };
        Ok(format!("memory://{key}?method={method}&expires_in={}", ttl.as_secs()))
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
