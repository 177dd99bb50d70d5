//! S3 binding of [`ObjectStore`].
//!
//! S3 has no integer object generation, so the generation lives in the
//! object's user metadata under [`GENERATION_METADATA_KEY`]. Creates use
//! `If-None-Match: *`. Replacements read the current generation and ETag
//! with `HeadObject`, then `PutObject` with `If-Match` on that ETag, so a
//! writer that slips in between the two calls fails the put.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_smithy_types::byte_stream::ByteStream;
use tracing::debug;

use crate::error::{StorageError, format_err_chain};
use crate::generation::Generation;
use crate::store::{ObjectStore, ReadOutput, SignedUrlMethod};

pub const GENERATION_METADATA_KEY: &str = "generation";

/// Error codes S3 returns when a conditional write loses.
const PRECONDITION_CODES: &[&str] = &["PreconditionFailed", "ConditionalRequestConflict"];

pub struct S3ObjectStore {
    client: RwLock<Option<Client>>,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client: RwLock::new(Some(client)),
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn client(&self) -> Result<Client, StorageError> {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(StorageError::Closed)
    }

    /// Current generation and ETag, or `None` if the object is gone.
    async fn head(&self, client: &Client, key: &str) -> Result<Option<(Generation, String)>, StorageError> {
        let resp = match client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let err = e.into_service_error();
                if err.is_not_found() {
                    return Ok(None);
                }
                return Err(StorageError::HeadObject(format_err_chain(&err)));
            }
        };

        let generation = generation_from_metadata(key, resp.metadata())?;
        let etag = resp
            .e_tag()
            .map(|s| s.to_string())
            .ok_or_else(|| StorageError::HeadObject(format!("no ETag returned for {key}")))?;
        Ok(Some((generation, etag)))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn read(&self, key: &str) -> Result<ReadOutput, StorageError> {
        let client = self.client()?;
        let resp = match client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    debug!(bucket = %self.bucket, key, "object absent");
                    return Ok(ReadOutput::absent());
                }
                return Err(StorageError::GetObject(format_err_chain(&err)));
            }
        };

        let generation = generation_from_metadata(key, resp.metadata())?;
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StorageError::GetObject(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(ReadOutput {
            body: Some(body),
            generation,
        })
    }

    /// Conditional replace. The `If-Match` guard compares ETags, and for a
    /// single-part PUT the ETag is the MD5 of the body alone. A replacement
    /// whose bytes equal the current body leaves the ETag unchanged, so a
    /// second writer holding the same ETag also succeeds and both get the
    /// same generation back. Callers must not write back an unchanged body;
    /// `HistoryService::rewrite` skips such writes.
    async fn write(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
        expected: Generation,
    ) -> Result<Generation, StorageError> {
        let client = self.client()?;
        let precondition_failed = || StorageError::PreconditionFailed {
            key: key.to_string(),
            expected,
        };

        let next = expected.next();
        let mut req = client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .metadata(GENERATION_METADATA_KEY, next.to_string())
            .body(ByteStream::from(body));

        req = if expected.is_absent() {
            req.if_none_match("*")
        } else {
            match self.head(&client, key).await? {
                Some((current, etag)) if current == expected => req.if_match(etag),
                _ => return Err(precondition_failed()),
            }
        };

        req.send().await.map_err(|e| {
            let err = e.into_service_error();
            if err.code().is_some_and(|code| PRECONDITION_CODES.contains(&code)) {
                precondition_failed()
            } else {
                StorageError::PutObject(format_err_chain(&err))
            }
        })?;

        debug!(bucket = %self.bucket, key, generation = %next, "object written");
        Ok(next)
    }

    async fn signed_url(
        &self,
        key: &str,
        method: SignedUrlMethod,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let client = self.client()?;
        let presign_config = PresigningConfig::builder()
            .expires_in(ttl)
            .build()
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned = match method {
            SignedUrlMethod::Get => client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presign_config)
                .await
                .map_err(|e| StorageError::Presign(e.to_string()))?,
            SignedUrlMethod::Put => client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .presigned(presign_config)
                .await
                .map_err(|e| StorageError::Presign(e.to_string()))?,
        };

        Ok(presigned.uri().to_string())
    }

    async fn close(&self) -> Result<(), StorageError> {
        let released = self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if released.is_some() {
            debug!(bucket = %self.bucket, "S3 client released");
        }
        Ok(())
    }
}

/// Objects written without the metadata entry predate generations and are
/// treated as the first one.
pub fn generation_from_metadata(
    key: &str,
    metadata: Option<&HashMap<String, String>>,
) -> Result<Generation, StorageError> {
    match metadata.and_then(|m| m.get(GENERATION_METADATA_KEY)) {
        None => Ok(Generation::new(1)),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|g| *g > 0)
            .map(Generation::new)
            .ok_or_else(|| StorageError::InvalidGeneration {
                key: key.to_string(),
                value: raw.clone(),
            }),
    }
}
