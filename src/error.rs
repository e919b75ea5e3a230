//! Error types for the backend probe.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for probe operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a response (connection refused, reset, DNS...).
    #[error("request to {path} failed: {reason}")]
    Transport { path: String, reason: String },

    /// The request did not complete within its timeout.
    #[error("request to {path} timed out after {}s", timeout.as_secs())]
    Timeout { path: String, timeout: Duration },

    /// A non-empty response body was not valid JSON.
    #[error("failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },

    /// Probe configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error while writing the report.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed.
    #[error("failed to serialize report: {0}")]
    Report(String),
}

impl Error {
    /// Returns true if the backend could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Timeout { .. })
    }
}

/// Result type alias for probe operations.
pub type Result<T> = std::result::Result<T, Error>;
