//! Upload scheduler - drains the queue into gated dispatches
//!
//! The [`UploadScheduler`] sits between the [`UploadQueue`] and an
//! [`UploadDispatcher`]. On every tick of a fixed interval it takes at most one
//! entry off the queue and, if the [`UploadGate`] is free, spawns a dispatch
//! task that owns the gate guard.
//!
//! ## Flow
//!
//! ```text
//! interval tick ──→ gate held? ──yes──→ skip
//!                       │ no
//!                       ▼
//!                 dequeue one ──empty──→ idle
//!                       │
//!                 file exists? ──no──→ drop silently
//!                       │ yes
//!                       ▼
//!            acquire gate, spawn dispatch (guard moves into the task)
//! ```
//!
//! Ticks never overlap: the loop awaits nothing but the interval and the
//! shutdown token, so a tick body always finishes before the next one starts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uplink_core::ports::UploadDispatcher;

use crate::gate::{GateGuard, UploadGate};
use crate::queue::UploadQueue;

// ============================================================================
// TickOutcome
// ============================================================================

/// What a single scheduler tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// The gate was held; the queue was not touched
    Busy,
    /// Nothing was queued
    Idle,
    /// The dequeued file no longer exists and was dropped without dispatch
    SourceMissing(PathBuf),
    /// A dispatch task was spawned for `path`
    Dispatched {
        /// The file being uploaded
        path: PathBuf,
        /// The dispatch task; it holds the gate until it finishes
        task: JoinHandle<()>,
    },
}

// ============================================================================
// UploadScheduler
// ============================================================================

/// Polls the upload queue and dispatches one file at a time
pub struct UploadScheduler {
    queue: UploadQueue,
    gate: UploadGate,
    dispatcher: Arc<dyn UploadDispatcher>,
    poll_interval: Duration,
}

impl std::fmt::Debug for UploadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadScheduler")
            .field("queue_len", &self.queue.len())
            .field("gate_held", &self.gate.is_held())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl UploadScheduler {
    /// Creates a new `UploadScheduler`
    ///
    /// # Arguments
    /// * `queue` - Queue filled by the change debouncer
    /// * `gate` - Gate shared with anything else that must not overlap uploads
    /// * `dispatcher` - Delivers a file to the configured hosts
    /// * `poll_interval` - Time between ticks
    pub fn new(
        queue: UploadQueue,
        gate: UploadGate,
        dispatcher: Arc<dyn UploadDispatcher>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            queue,
            gate,
            dispatcher,
            poll_interval,
        }
    }

    /// Time between ticks
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Runs one scheduling step
    ///
    /// Must be called from within a tokio runtime; dispatches are spawned
    /// onto the current one.
    pub fn tick(&self) -> TickOutcome {
        if self.gate.is_held() {
            trace!(queued = self.queue.len(), "Upload in progress, skipping tick");
            return TickOutcome::Busy;
        }

        let Some(pending) = self.queue.try_dequeue() else {
            return TickOutcome::Idle;
        };

        if !pending.path().exists() {
            debug!(path = %pending.path().display(), "Queued file no longer exists, dropping");
            return TickOutcome::SourceMissing(pending.into_path());
        }

        let Some(guard) = self.gate.try_acquire() else {
            // Someone else took the gate between the check and the acquire.
            self.queue.requeue_front(pending);
            return TickOutcome::Busy;
        };

        let path = pending.into_path();
        let task = self.spawn_dispatch(path.clone(), guard);
        TickOutcome::Dispatched { path, task }
    }

    fn spawn_dispatch(&self, path: PathBuf, guard: GateGuard) -> JoinHandle<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let _guard = guard;
            match dispatcher.upload(&path).await {
                Ok(report) => debug!(
                    path = %path.display(),
                    attempts = report.attempts(),
                    delivered = report.delivered(),
                    failed = report.failed(),
                    "Dispatch finished"
                ),
                Err(e) => warn!(path = %path.display(), error = %e, "Dispatch aborted"),
            }
        })
    }

    /// Ticks every `poll_interval` until `shutdown` is cancelled
    ///
    /// An in-flight dispatch is not awaited on shutdown; it keeps running on
    /// the runtime until it completes or the runtime is dropped.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Upload scheduler started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(queued = self.queue.len(), "Upload scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    if let TickOutcome::Dispatched { path, .. } = self.tick() {
                        trace!(path = %path.display(), "Dispatch spawned");
                    }
                }
            }
        }
    }
}
