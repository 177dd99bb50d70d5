use std::time::Duration;

use convo_core::error::{CodecError, KeyError};
use convo_storage::{Generation, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("invalid source identifier")]
    Validation(#[from] KeyError),

    #[error("get_history {source_id}: storage read failed")]
    Read {
        source_id: String,
        source: StorageError,
    },

    #[error("get_history {source_id}: stored history is corrupt")]
    Decode {
        source_id: String,
        source: CodecError,
    },

    #[error("put_history {source_id}: storage write failed")]
    Write {
        source_id: String,
        source: StorageError,
    },

    #[error("put_history {source_id}: concurrent modification, generation {expected} is stale")]
    ConcurrentModification {
        source_id: String,
        expected: Generation,
    },

    #[error("put_history {source_id}: messages could not be encoded")]
    Encode {
        source_id: String,
        source: CodecError,
    },

    #[error("{op} {source_id}: storage timed out after {limit:?}")]
    Timeout {
        op: &'static str,
        source_id: String,
        limit: Duration,
    },
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Read,
    Write,
    Timeout,
}

impl HistoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Read { .. } | Self::Decode { .. } => ErrorKind::Read,
            Self::Write { .. } | Self::ConcurrentModification { .. } | Self::Encode { .. } => {
                ErrorKind::Write
            }
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub fn is_concurrent_modification(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Bad input or a lost race: the caller can fix or retry it.
    pub fn is_retryable_by_caller(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ConcurrentModification { .. }
        )
    }

    /// Persisted data that no longer decodes. Needs an operator.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    pub(crate) fn from_read(source_id: &str, err: StorageError) -> Self {
        match err {
            StorageError::Timeout { limit, .. } => Self::Timeout {
                op: "get_history",
                source_id: source_id.to_string(),
                limit,
            },
            source => Self::Read {
                source_id: source_id.to_string(),
                source,
            },
        }
    }

    pub(crate) fn from_write(source_id: &str, err: StorageError) -> Self {
        match err {
            StorageError::PreconditionFailed { expected, .. } => Self::ConcurrentModification {
                source_id: source_id.to_string(),
                expected,
            },
            StorageError::Timeout { limit, .. } => Self::Timeout {
                op: "put_history",
                source_id: source_id.to_string(),
                limit,
            },
            source => Self::Write {
                source_id: source_id.to_string(),
                source,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}
