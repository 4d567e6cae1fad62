//! Upload gate
//!
//! A single flag that allows at most one dispatch at a time. Acquiring it
//! yields a [`GateGuard`]; the flag is cleared when the guard is dropped. The
//! guard moves into the dispatch task, so the gate is released on every exit
//! path of that task: normal return, error, or panic unwinding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

/// Mutual-exclusion flag for uploads
///
/// Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct UploadGate {
    held: Arc<AtomicBool>,
}

impl UploadGate {
    /// Creates a clear gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a guard is alive
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Sets the flag if it is clear
    ///
    /// Returns `None` if another guard currently holds the gate.
    pub fn try_acquire(&self) -> Option<GateGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| {
                trace!("Upload gate acquired");
                GateGuard {
                    held: Arc::clone(&self.held),
                }
            })
    }
}

/// Proof of holding the [`UploadGate`]; releases it on drop
#[derive(Debug)]
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard {
    held: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
        trace!("Upload gate released");
    }
}
