//! Delayed enqueue of change events
//!
//! [`ChangeDebouncer`] gives every change its own quiet period: each call to
//! [`schedule`](ChangeDebouncer::schedule) spawns a task that sleeps for the
//! quiet period and then enqueues the path. Earlier schedules are never
//! cancelled, so N changes inside one window produce N queue entries, each
//! delayed from its own trigger. This is not a leading or trailing-edge
//! debounce; the upload gate and queue absorb the resulting duplicates.

use std::path::PathBuf;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;
use uplink_core::domain::PendingUpload;

use crate::queue::UploadQueue;
use crate::SyncError;

/// Schedules a delayed enqueue for every change it is told about
///
/// Cloneable and callable from any thread, including the notify callback
/// thread; scheduling only spawns onto the captured runtime and never blocks.
#[derive(Debug, Clone)]
pub struct ChangeDebouncer {
    queue: UploadQueue,
    quiet_period: Duration,
    runtime: Handle,
}

impl ChangeDebouncer {
    /// Creates a debouncer bound to the current tokio runtime
    ///
    /// # Errors
    /// Returns [`SyncError::NoRuntime`] when called outside a runtime.
    pub fn new(queue: UploadQueue, quiet_period: Duration) -> Result<Self, SyncError> {
        Ok(Self::with_handle(queue, quiet_period, Handle::try_current()?))
    }

    /// Creates a debouncer that spawns onto `runtime`
    pub fn with_handle(queue: UploadQueue, quiet_period: Duration, runtime: Handle) -> Self {
        Self {
            queue,
            quiet_period,
            runtime,
        }
    }

    /// The fixed delay applied to every change
    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Enqueues `path` once the quiet period has elapsed from now
    ///
    /// The returned handle may be dropped; the enqueue still happens.
    pub fn schedule(&self, path: PathBuf) -> JoinHandle<()> {
        let queue = self.queue.clone();
        let delay = self.quiet_period;
        debug!(path = %path.display(), delay_ms = delay.as_millis() as u64, "Scheduling delayed enqueue");

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            queue.enqueue(PendingUpload::new(path));
        })
    }
}
