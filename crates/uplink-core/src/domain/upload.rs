//! Upload value types
//!
//! [`PendingUpload`] is what the queue holds. [`UploadPayload`] is the JSON
//! body, built from the current config and the file contents at dispatch time.
//! [`DispatchReport`] records what happened at each host.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ============================================================================
// PendingUpload
// ============================================================================

/// A file path waiting in the upload queue
///
/// Duplicates are allowed; each entry is dispatched independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    path: PathBuf,
}

impl PendingUpload {
    /// Creates a pending upload for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The queued file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consumes the entry, returning its path
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

impl From<PathBuf> for PendingUpload {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

// ============================================================================
// UploadPayload
// ============================================================================

/// The JSON document posted to every host
///
/// Serializes as `{"apiKey": "...", "fileContents": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    /// API key taken from the configuration snapshot at dispatch time
    pub api_key: String,
    /// Full text of the watched file, read at dispatch time
    pub file_contents: String,
}

impl UploadPayload {
    /// Creates a payload from an API key and file text
    pub fn new(api_key: impl Into<String>, file_contents: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            file_contents: file_contents.into(),
        }
    }

    /// Serializes the payload to compact JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

// ============================================================================
// Dispatch outcomes
// ============================================================================

/// Terminal outcome of one POST to one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostResult {
    /// The host answered with a 2xx status
    Delivered {
        /// HTTP status code
        status: u16,
    },
    /// The host answered with a non-2xx status
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body text, logged as the failure message
        body: String,
    },
    /// The request never produced a response (connect failure, timeout, ...)
    TransportFailed {
        /// Error message
        message: String,
    },
}

impl HostResult {
    /// Returns true for [`HostResult::Delivered`]
    pub fn is_delivered(&self) -> bool {
        matches!(self, HostResult::Delivered { .. })
    }
}

/// Outcome for a single host within a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOutcome {
    /// Host base URL as configured
    pub host: String,
    /// Full URL that was posted to
    pub url: String,
    /// What happened
    pub result: HostResult,
}

/// Result of dispatching one file to every configured host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Path of the uploaded file relative to the watch directory (for logging)
    pub relative_path: PathBuf,
    /// One entry per host, in host-list order
    pub outcomes: Vec<HostOutcome>,
}

impl DispatchReport {
    /// Number of POST attempts made
    pub fn attempts(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of hosts that accepted the upload
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_delivered()).count()
    }

    /// Number of hosts that rejected the upload or could not be reached
    pub fn failed(&self) -> usize {
        self.attempts() - self.delivered()
    }
}
