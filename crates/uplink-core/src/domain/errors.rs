//! Domain error types
//!
//! [`DomainError`] covers invalid configuration-derived host values.
//! [`UploadError`] covers a dispatch that could not reach its host loop at
//! all; per-host failures are reported as [`HostResult`](super::HostResult)
//! values instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when constructing domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A configured host is not an absolute http(s) URL
    #[error("Invalid host '{host}': {reason}")]
    InvalidHost {
        /// The host string as configured
        host: String,
        /// Why it was rejected
        reason: String,
    },

    /// No upload hosts are configured
    #[error("No upload hosts configured")]
    NoHosts,
}

/// Errors that abort a dispatch before any host is attempted
#[derive(Debug, Error)]
pub enum UploadError {
    /// The source file could not be read at dispatch time
    #[error("Unable to read {path}: {source}")]
    ReadFailed {
        /// The file that was being uploaded
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The payload could not be serialized to JSON
    #[error("Unable to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}
