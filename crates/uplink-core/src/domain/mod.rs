//! Domain types for the upload pipeline
//!
//! This module contains the value types that flow through Uplink:
//! - [`WatchTarget`] - the directory and file name being watched
//! - [`PendingUpload`] - a queued path awaiting dispatch
//! - [`UploadPayload`] - the JSON body built fresh for each dispatch
//! - [`HostList`] / [`HostUrl`] - the ordered upload endpoints
//! - [`DispatchReport`] - per-host outcomes of a single dispatch
//! - Domain-specific error types

pub mod errors;
pub mod hosts;
pub mod upload;
pub mod watch_target;

// Re-export commonly used types
pub use errors::{DomainError, UploadError};
pub use hosts::{HostList, HostUrl, UPLOAD_PATH};
pub use upload::{DispatchReport, HostOutcome, HostResult, PendingUpload, UploadPayload};
pub use watch_target::WatchTarget;
