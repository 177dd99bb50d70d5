use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use super::{is_false, null_as_default};

/// A content part of a user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserPart {
    Text(TextPart),
    FileData(FileDataPart),
}

/// A content part of an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantPart {
    Text(AssistantTextPart),
    FileData(AssistantFileDataPart),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

/// Assistant text, optionally flagged as a model "thought".
///
/// `thought_signature` is an opaque token the model hands back with its
/// reasoning; it has to be replayed verbatim on the next turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantTextPart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_false")]
    pub thought: bool,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub thought_signature: String,
}

/// A user-supplied file held in the media store.
///
/// `storage_key` is opaque to the history subsystem: it is stored and
/// returned but never dereferenced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDataPart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub storage_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_metadata: Option<VideoMetadata>,
}

/// A file produced by the assistant (generated image, audio and so on).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantFileDataPart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub storage_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
}

/// Clip window for a video attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    #[serde(default, with = "offset")]
    pub start_offset: SignedDuration,
    #[serde(default, with = "offset")]
    pub end_offset: SignedDuration,
    /// Must be finite; NaN and infinities fail the encode.
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "finite_fps")]
    pub fps: Option<f64>,
}

impl UserPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextPart { text: text.into() })
    }
}

impl AssistantPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(AssistantTextPart {
            text: text.into(),
            ..Default::default()
        })
    }

    pub fn thought(text: impl Into<String>, signature: impl Into<String>) -> Self {
        Self::Text(AssistantTextPart {
            text: text.into(),
            thought: true,
            thought_signature: signature.into(),
        })
    }
}

/// JSON has no NaN or infinity, and serde_json would quietly write `null`.
fn finite_fps<S: serde::Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(fps) if !fps.is_finite() => Err(serde::ser::Error::custom(format!(
            "videoMetadata.fps must be finite, got {fps}"
        ))),
        Some(fps) => serializer.serialize_some(fps),
        None => serializer.serialize_none(),
    }
}

/// Durations are written in the compact `1m30s500ms` form. On read the
/// compact and ISO 8601 (`PT1M30.5S`) forms are accepted, as is a bare
/// integer count of nanoseconds.
mod offset {
    use jiff::SignedDuration;
    use jiff::fmt::friendly::{Designator, Spacing, SpanPrinter};
    use serde::{Deserialize, Deserializer, Serializer, de};

    static PRINTER: SpanPrinter = SpanPrinter::new()
        .designator(Designator::Compact)
        .spacing(Spacing::None);

    pub fn serialize<S: Serializer>(value: &SignedDuration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&PRINTER.duration_to_string(value))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Nanos(i64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SignedDuration, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(SignedDuration::ZERO),
            Some(Raw::Nanos(nanos)) => Ok(SignedDuration::from_nanos(nanos)),
            Some(Raw::Text(raw)) if raw.trim().is_empty() => Ok(SignedDuration::ZERO),
            Some(Raw::Text(raw)) => raw
                .trim()
                .parse::<SignedDuration>()
                .map_err(|e| de::Error::custom(format!("invalid duration {raw:?}: {e}"))),
        }
    }
}
