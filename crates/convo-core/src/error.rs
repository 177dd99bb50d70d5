use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode history")]
    Encode(#[source] serde_json::Error),

    #[error("history object {key} is not valid UTF-8")]
    InvalidUtf8 {
        key: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("malformed record in {key} at line {line}")]
    Parse {
        key: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("source identifier is empty")]
    Empty,

    #[error("source identifier {0:?} contains a path separator or '..'")]
    PathTraversal(String),
}
