use std::time::Duration;

use convo_storage::DEFAULT_STORAGE_TIMEOUT;

use crate::error::ConfigError;

pub const DEFAULT_BUCKET: &str = "convo-history";

/// Where history lives and how long storage calls may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub bucket: String,
    /// Prepended to every source identifier to form the object key.
    pub key_prefix: String,
    pub region: Option<String>,
    /// S3-compatible endpoint override (MinIO, LocalStack).
    pub endpoint: Option<String>,
    pub storage_timeout: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            key_prefix: String::new(),
            region: None,
            endpoint: None,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

impl HistoryConfig {
    /// Read `CONVO_BUCKET`, `CONVO_KEY_PREFIX`, `AWS_REGION`,
    /// `CONVO_S3_ENDPOINT` and `CONVO_STORAGE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let storage_timeout = match non_empty("CONVO_STORAGE_TIMEOUT_MS") {
            None => defaults.storage_timeout,
            Some(raw) => parse_timeout_ms(&raw)?,
        };

        Ok(Self {
            bucket: non_empty("CONVO_BUCKET").unwrap_or(defaults.bucket),
            key_prefix: lookup("CONVO_KEY_PREFIX").unwrap_or_default(),
            region: non_empty("AWS_REGION"),
            endpoint: non_empty("CONVO_S3_ENDPOINT"),
            storage_timeout,
        })
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        var: "CONVO_STORAGE_TIMEOUT_MS",
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let ms: u64 = raw.trim().parse().map_err(|_| invalid("not a whole number of milliseconds"))?;
    if ms == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}
