use serde::{Deserialize, Serialize};

use super::null_as_default;
use super::part::{AssistantPart, UserPart};

/// One entry of a conversation history.
///
/// Storage order is authoritative: `timestamp` is caller-supplied and may
/// collide or run backwards under clock skew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    /// Platform message identifier. Empty on records written before the
    /// identifier was captured.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub message_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<UserPart>,
    pub timestamp: jiff::Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub model_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<AssistantPart>,
    pub timestamp: jiff::Timestamp,
}

impl Message {
    pub fn role(&self) -> Role {
        match self {
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
        }
    }

    pub fn timestamp(&self) -> jiff::Timestamp {
        match self {
            Self::User(m) => m.timestamp,
            Self::Assistant(m) => m.timestamp,
        }
    }

    /// Concatenated visible text. Thought parts and files are skipped.
    pub fn text(&self) -> String {
        match self {
            Self::User(m) => m
                .parts
                .iter()
                .filter_map(|p| match p {
                    UserPart::Text(t) => Some(t.text.as_str()),
                    UserPart::FileData(_) => None,
                })
                .collect(),
            Self::Assistant(m) => m
                .parts
                .iter()
                .filter_map(|p| match p {
                    AssistantPart::Text(t) if !t.thought => Some(t.text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

impl UserMessage {
    /// A single-part text message without a platform message ID.
    pub fn text(user_id: impl Into<String>, text: impl Into<String>, timestamp: jiff::Timestamp) -> Self {
        Self {
            message_id: String::new(),
            user_id: user_id.into(),
            parts: vec![UserPart::text(text)],
            timestamp,
        }
    }
}

impl AssistantMessage {
    pub fn text(model_name: impl Into<String>, text: impl Into<String>, timestamp: jiff::Timestamp) -> Self {
        Self {
            model_name: model_name.into(),
            parts: vec![AssistantPart::text(text)],
            timestamp,
        }
    }
}

impl From<UserMessage> for Message {
    fn from(m: UserMessage) -> Self {
        Self::User(m)
    }
}

impl From<AssistantMessage> for Message {
    fn from(m: AssistantMessage) -> Self {
        Self::Assistant(m)
    }
}
