//! convo-core
//!
//! Pure domain types, the JSONL history codec, and object key conventions.
//! No AWS SDK dependency — this is the shared vocabulary of the history
//! subsystem.

pub mod codec;
pub mod error;
pub mod models;
pub mod s3_keys;
pub mod source_id;

pub use models::message::{AssistantMessage, Message, Role, UserMessage};
pub use models::part::{
    AssistantFileDataPart, AssistantPart, AssistantTextPart, FileDataPart, TextPart, UserPart,
    VideoMetadata,
};
