//! Upload pipeline - wiring of watcher, debouncer, queue, gate and scheduler
//!
//! ## Architecture
//!
//! ```text
//!  FileWatcher ──→ ChangeDebouncer ──(quiet period)──→ UploadQueue
//!                                                          │
//!                         UploadScheduler (every poll) ◄───┘
//!                                 │
//!                          UploadGate ──→ UploadDispatcher
//! ```
//!
//! The pipeline owns at most one live watcher. Watching a new target drops
//! the previous watcher first, so there is never more than one source of
//! change events. The queue, gate and scheduler live for the lifetime of the
//! pipeline and are unaffected by rewatching.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uplink_audit::ActivityLog;
use uplink_core::domain::WatchTarget;
use uplink_core::ports::UploadDispatcher;
use uplink_core::Config;

use crate::debounce::ChangeDebouncer;
use crate::gate::UploadGate;
use crate::queue::UploadQueue;
use crate::scheduler::UploadScheduler;
use crate::watcher::FileWatcher;
use crate::SyncError;

/// Result of [`UploadPipeline::watch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchStatus {
    /// The watcher is running
    Active,
    /// The configured game folder does not contain the watch directory
    InvalidFolder,
    /// The directory exists but the OS watcher could not be attached
    Failed(String),
}

impl WatchStatus {
    /// Returns true for [`WatchStatus::Active`]
    pub fn is_active(&self) -> bool {
        matches!(self, WatchStatus::Active)
    }
}

/// Owns every long-lived piece of the watch-to-upload path
pub struct UploadPipeline {
    queue: UploadQueue,
    gate: UploadGate,
    debouncer: ChangeDebouncer,
    scheduler: Arc<UploadScheduler>,
    activity: Arc<ActivityLog>,
    watcher: Option<FileWatcher>,
}

impl std::fmt::Debug for UploadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPipeline")
            .field("watcher", &self.watcher)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl UploadPipeline {
    /// Builds the pipeline from the `watch` timings in `config`
    ///
    /// No watcher is started; call [`watch`](Self::watch) for that.
    ///
    /// # Errors
    /// Returns [`SyncError::NoRuntime`] when called outside a tokio runtime.
    pub fn new(
        config: &Config,
        dispatcher: Arc<dyn UploadDispatcher>,
        activity: Arc<ActivityLog>,
    ) -> Result<Self, SyncError> {
        let queue = UploadQueue::new();
        let gate = UploadGate::new();
        let debouncer = ChangeDebouncer::new(
            queue.clone(),
            Duration::from_millis(config.watch.quiet_period_ms),
        )?;
        let scheduler = Arc::new(UploadScheduler::new(
            queue.clone(),
            gate.clone(),
            dispatcher,
            Duration::from_millis(config.watch.poll_interval_ms),
        ));

        Ok(Self {
            queue,
            gate,
            debouncer,
            scheduler,
            activity,
            watcher: None,
        })
    }

    /// Replaces the current watcher with one on `target`
    ///
    /// The old watcher is always stopped, even when the new target turns out
    /// to be unusable. Queued uploads are kept.
    pub fn watch(&mut self, target: WatchTarget) -> WatchStatus {
        self.unwatch();

        if !target.exists() {
            warn!(path = %target.directory().display(), "Watch directory does not exist");
            self.activity.error("ERROR: invalid WoW folder");
            return WatchStatus::InvalidFolder;
        }

        let debouncer = self.debouncer.clone();
        let activity = Arc::clone(&self.activity);
        let relative_to = target.clone();
        let started = FileWatcher::start(target.clone(), move |change| {
            activity.debug(format!(
                "File changed: {}",
                relative_to.relative_path(change.path()).display()
            ));
            debouncer.schedule(change.into_path());
        });

        match started {
            Ok(watcher) => {
                self.activity
                    .info(format!("Watching {}", target.directory().display()));
                self.watcher = Some(watcher);
                WatchStatus::Active
            }
            Err(SyncError::DirectoryNotFound(_)) => {
                self.activity.error("ERROR: invalid WoW folder");
                WatchStatus::InvalidFolder
            }
            Err(e) => {
                self.activity.error(format!("EXCEPTION: {e}"));
                WatchStatus::Failed(e.to_string())
            }
        }
    }

    /// Stops the current watcher, if any
    pub fn unwatch(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            if let Err(e) = watcher.stop() {
                warn!(error = %e, "Failed to stop previous watcher cleanly");
            }
        }
    }

    /// Returns true while a watcher is running
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// The target currently being watched
    pub fn watch_target(&self) -> Option<&WatchTarget> {
        self.watcher.as_ref().map(FileWatcher::target)
    }

    /// Queues `path` for upload after the quiet period, as if it had changed
    pub fn notify_changed(&self, path: &Path) -> JoinHandle<()> {
        self.debouncer.schedule(path.to_path_buf())
    }

    pub fn queue(&self) -> &UploadQueue {
        &self.queue
    }

    pub fn gate(&self) -> &UploadGate {
        &self.gate
    }

    pub fn activity(&self) -> &Arc<ActivityLog> {
        &self.activity
    }

    pub fn scheduler(&self) -> Arc<UploadScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Starts the scheduler loop on the current runtime
    pub fn spawn_scheduler(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(&self.scheduler);
        info!("Spawning upload scheduler");
        tokio::spawn(async move { scheduler.run(shutdown).await })
    }
}

impl Drop for UploadPipeline {
    fn drop(&mut self) {
        self.unwatch();
    }
}
