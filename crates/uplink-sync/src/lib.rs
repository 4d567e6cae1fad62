//! Uplink Sync - from filesystem change to queued, gated upload
//!
//! Provides:
//! - Change debouncing (each change independently delayed)
//! - A FIFO upload queue drained on a fixed cadence
//! - A single-holder upload gate with guaranteed release
//! - The poll-driven scheduler that ties them to an upload dispatcher
//!
//! ## Modules
//!
//! - [`watcher`] - notify-backed file watcher filtered to one file name
//! - [`debounce`] - delayed enqueue of change events
//! - [`queue`] - pending upload queue
//! - [`gate`] - upload gate and its RAII guard
//! - [`scheduler`] - poll loop that dequeues and dispatches
//! - [`pipeline`] - wiring of the above, including rewatch

pub mod debounce;
pub mod gate;
pub mod pipeline;
pub mod queue;
pub mod scheduler;
pub mod watcher;

use std::path::PathBuf;

use thiserror::Error;

pub use debounce::ChangeDebouncer;
pub use gate::{GateGuard, UploadGate};
pub use pipeline::{UploadPipeline, WatchStatus};
pub use queue::UploadQueue;
pub use scheduler::{TickOutcome, UploadScheduler};
pub use watcher::{ChangeEvent, FileWatcher};

/// Errors that can occur while setting up the watch side of the pipeline
#[derive(Debug, Error)]
pub enum SyncError {
    /// The OS watcher could not be created or could not watch the path
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// The watch directory does not exist
    #[error("Watch directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// No tokio runtime was available to schedule delayed work on
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
