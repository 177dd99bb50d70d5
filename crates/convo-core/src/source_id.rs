//! Validation of conversation-source identifiers.
//!
//! Identifiers come from the messaging platform and are used verbatim as
//! object keys, so anything that could step outside the key namespace is
//! rejected before it reaches storage.

use crate::error::KeyError;

/// Check a source identifier, returning it unchanged on success.
pub fn validate(source_id: &str) -> Result<&str, KeyError> {
    if source_id.trim().is_empty() {
        return Err(KeyError::Empty);
    }
    if source_id.contains('/') || source_id.contains('\\') || source_id.contains("..") {
        return Err(KeyError::PathTraversal(source_id.to_string()));
    }
    Ok(source_id)
}
