use std::time::Duration;

use thiserror::Error;

use crate::generation::Generation;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("precondition failed for key {key} (expected generation {expected})")]
    PreconditionFailed { key: String, expected: Generation },

    #[error("S3 GetObject error: {0}")]
    GetObject(String),

    #[error("S3 PutObject error: {0}")]
    PutObject(String),

    #[error("S3 HeadObject error: {0}")]
    HeadObject(String),

    #[error("S3 presign error: {0}")]
    Presign(String),

    #[error("invalid generation metadata on {key}: {value:?}")]
    InvalidGeneration { key: String, value: String },

    /// `limit` is the time the call was actually allowed: the budget, or
    /// less when a caller deadline was tighter.
    #[error("{op} on {key} timed out after {limit:?}")]
    Timeout {
        op: &'static str,
        key: String,
        limit: Duration,
    },

    #[error("object store is closed")]
    Closed,
}

impl StorageError {
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// AWS SDK errors often have terse `Display` impls (e.g. "service error")
/// but useful detail in the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
