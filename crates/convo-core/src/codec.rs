//! JSON Lines encoding of a conversation history.
//!
//! One record per line, in storage order, each line terminated by `\n`
//! (including the last). Records carry a `role` discriminator and every part
//! a `type` discriminator; unknown discriminators fail the decode, unknown
//! fields are ignored.

use crate::error::CodecError;
use crate::models::message::Message;

/// MIME type written alongside encoded history objects.
pub const CONTENT_TYPE: &str = "application/jsonl";

/// Encode messages as JSONL.
///
/// Failure here means a value could not be represented as JSON, which is a
/// programming error rather than an I/O condition.
pub fn encode(messages: &[Message]) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(messages.len() * 256);
    for message in messages {
        serde_json::to_writer(&mut buf, message).map_err(CodecError::Encode)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

/// Decode a JSONL history object read from `key`.
///
/// Blank and whitespace-only lines are skipped. Any other line that does not
/// parse fails the whole decode; there is no partial recovery.
pub fn decode(key: &str, bytes: &[u8]) -> Result<Vec<Message>, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|source| CodecError::InvalidUtf8 {
        key: key.to_string(),
        source,
    })?;

    let mut messages = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let message = serde_json::from_str(line).map_err(|source| CodecError::Parse {
            key: key.to_string(),
            line: idx + 1,
            source,
        })?;
        messages.push(message);
    }
    Ok(messages)
}
