//! convo-history
//!
//! Conversation history read/write with generation-based optimistic
//! concurrency. The only entry point domain code should call.

pub mod config;
pub mod error;
pub mod service;

use convo_storage::{S3ObjectStore, TimeoutStore};

pub use config::HistoryConfig;
pub use error::{ErrorKind, HistoryError};
pub use service::{ConversationHistory, HistoryService, RewriteOutcome};

/// The production composition: S3 behind the storage deadline.
pub type S3HistoryService = HistoryService<TimeoutStore<S3ObjectStore>>;

/// Build an S3-backed service from configuration.
pub async fn connect(config: &HistoryConfig) -> S3HistoryService {
    let client = convo_storage::client::build_client(
        config.region.as_deref(),
        config.endpoint.as_deref(),
    )
    .await;
    let store = TimeoutStore::new(
        S3ObjectStore::new(client, config.bucket.clone()),
        config.storage_timeout,
    );
    tracing::info!(
        bucket = %config.bucket,
        key_prefix = %config.key_prefix,
        timeout_ms = config.storage_timeout.as_millis() as u64,
        "history store ready"
    );
    HistoryService::new(store).with_key_prefix(config.key_prefix.clone())
}
