//! Pending upload queue
//!
//! An unbounded FIFO of [`PendingUpload`] entries shared between the
//! debouncer (producer) and the scheduler (consumer). Duplicate paths are kept
//! and dispatched independently.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uplink_core::domain::PendingUpload;

/// Thread-safe FIFO of pending uploads
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone, Default)]
pub struct UploadQueue {
    inner: Arc<Mutex<VecDeque<PendingUpload>>>,
}

impl UploadQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingUpload>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry at the tail
    pub fn enqueue(&self, pending: PendingUpload) {
        let mut entries = self.lock();
        debug!(path = %pending.path().display(), depth = entries.len() + 1, "Enqueued upload");
        entries.push_back(pending);
    }

    /// Pops the head entry, or `None` if the queue is empty
    pub fn try_dequeue(&self) -> Option<PendingUpload> {
        self.lock().pop_front()
    }

    /// Puts an entry back at the head so it is the next one dequeued
    pub fn requeue_front(&self, pending: PendingUpload) {
        self.lock().push_front(pending);
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
