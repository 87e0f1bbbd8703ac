// src/errors.rs

use thiserror::Error;

/// Failures that stop scans from being set up at all.
///
/// Individual probe failures are never reported through this type; they are
/// recorded as `ProbeFailure` outcomes inside the batch.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A malformed `VANGUARD_RECON_*` environment variable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}
