//! Upload dispatcher port (driven/secondary port)
//!
//! ## Design Notes
//!
//! - A dispatch that reaches its host loop always returns
//!   `Ok(DispatchReport)`, even when every host failed. `Err` is reserved for
//!   failures before any host is attempted (unreadable file, serialization).
//! - Implementations must attempt every host in order with no short-circuit.
//! - Uses `#[async_trait]` so the scheduler can hold an
//!   `Arc<dyn UploadDispatcher>`.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{DispatchReport, UploadError};

/// Delivers a file to every configured upload host
#[async_trait]
pub trait UploadDispatcher: Send + Sync {
    /// Reads `path` now and posts it to each host in order
    async fn upload(&self, path: &Path) -> Result<DispatchReport, UploadError>;
}
