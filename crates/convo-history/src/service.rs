//! Read and replace a source's history under optimistic concurrency.
//!
//! Protocol per key: `Absent (0) -> 1 -> 2 -> ...`. A write must present the
//! generation it read; a stale generation fails with
//! [`HistoryError::ConcurrentModification`]. Nothing here retries: merging
//! the caller's new messages onto a changed base is the caller's job.

use std::time::Instant;

use convo_core::models::message::Message;
use convo_core::{codec, s3_keys, source_id};
use convo_storage::{Generation, ObjectStore};
use tracing::{debug, error, info, warn};

use crate::error::HistoryError;

/// A snapshot of one source's history and the generation it was read at.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversationHistory {
    pub messages: Vec<Message>,
    pub generation: Generation,
}

/// Result of [`HistoryService::rewrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// Nothing stored for the source.
    Absent,
    /// Already in the current format; no write was made.
    Unchanged { generation: Generation },
    Rewritten {
        messages: usize,
        from: Generation,
        to: Generation,
    },
}

/// Stateless composition of key validation, the JSONL codec and a store.
/// Cheap to share across concurrent requests.
pub struct HistoryService<S> {
    store: S,
    key_prefix: String,
}

impl<S: ObjectStore> HistoryService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            key_prefix: String::new(),
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Object key for a source, after validation.
    pub fn source_key(&self, source_id: &str) -> Result<String, HistoryError> {
        let id = source_id::validate(source_id)?;
        Ok(s3_keys::history(&self.key_prefix, id))
    }

    /// Load the full history for `source_id`.
    ///
    /// A source that has never been written yields an empty history at
    /// generation 0.
    pub async fn get_history(&self, source_id: &str) -> Result<ConversationHistory, HistoryError> {
        let key = self.source_key(source_id)?;
        let started = Instant::now();

        let (stored, generation) = self.fetch(source_id, &key).await?;
        let Some((_, messages)) = stored else {
            debug!(source_id, "no history yet");
            return Ok(ConversationHistory::default());
        };

        debug!(
            source_id,
            generation = %generation,
            messages = messages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "history loaded"
        );
        Ok(ConversationHistory {
            messages,
            generation,
        })
    }

    /// Re-encode a stored history in the current record format.
    ///
    /// The write is skipped when re-encoding yields the stored bytes: an
    /// unchanged body keeps its S3 ETag, which would let a concurrent writer
    /// holding the same generation through as well.
    pub async fn rewrite(&self, source_id: &str) -> Result<RewriteOutcome, HistoryError> {
        let key = self.source_key(source_id)?;

        let (stored, generation) = self.fetch(source_id, &key).await?;
        let Some((body, messages)) = stored else {
            return Ok(RewriteOutcome::Absent);
        };

        let encoded = self.encode(source_id, &messages)?;
        if encoded == body {
            debug!(source_id, generation = %generation, "history already in current format");
            return Ok(RewriteOutcome::Unchanged { generation });
        }

        let to = self.write_encoded(source_id, &key, encoded, generation).await?;
        info!(source_id, from = %generation, to = %to, messages = messages.len(), "history rewritten");
        Ok(RewriteOutcome::Rewritten {
            messages: messages.len(),
            from: generation,
            to,
        })
    }

    /// Replace the history for `source_id` with `messages`, provided the
    /// stored generation is still `expected`. Returns the new generation.
    pub async fn put_history(
        &self,
        source_id: &str,
        messages: &[Message],
        expected: Generation,
    ) -> Result<Generation, HistoryError> {
        let key = self.source_key(source_id)?;
        let started = Instant::now();

        let body = self.encode(source_id, messages)?;
        let generation = self.write_encoded(source_id, &key, body, expected).await?;

        debug!(
            source_id,
            generation = %generation,
            messages = messages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "history stored"
        );
        Ok(generation)
    }

    /// Raw body and decoded messages, or `None` if nothing is stored.
    async fn fetch(
        &self,
        source_id: &str,
        key: &str,
    ) -> Result<(Option<(Vec<u8>, Vec<Message>)>, Generation), HistoryError> {
        let output = self.store.read(key).await.map_err(|e| {
            let err = HistoryError::from_read(source_id, e);
            warn!(source_id, key, error = %err, "history read failed");
            err
        })?;

        let Some(body) = output.body else {
            return Ok((None, Generation::ABSENT));
        };

        let messages = codec::decode(key, &body).map_err(|source| {
            error!(source_id, key, error = %source, "stored history does not decode");
            HistoryError::Decode {
                source_id: source_id.to_string(),
                source,
            }
        })?;
        Ok((Some((body, messages)), output.generation))
    }

    fn encode(&self, source_id: &str, messages: &[Message]) -> Result<Vec<u8>, HistoryError> {
        codec::encode(messages).map_err(|source| {
            error!(source_id, error = %source, "history encode failed");
            HistoryError::Encode {
                source_id: source_id.to_string(),
                source,
            }
        })
    }

    async fn write_encoded(
        &self,
        source_id: &str,
        key: &str,
        body: Vec<u8>,
        expected: Generation,
    ) -> Result<Generation, HistoryError> {
        self.store
            .write(key, codec::CONTENT_TYPE, body, expected)
            .await
            .map_err(|e| {
                let err = HistoryError::from_write(source_id, e);
                warn!(source_id, key, expected = %expected, error = %err, "history write failed");
                err
            })
    }
}
