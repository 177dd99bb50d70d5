//! Object key conventions.
//!
//! Pure string functions — no AWS SDK dependency.

/// Object key holding the history of one conversation source.
///
/// The identifier must already have passed [`crate::source_id::validate`].
pub fn history(prefix: &str, source_id: &str) -> String {
    format!("{prefix}{source_id}")
}
