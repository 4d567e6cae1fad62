//! ActivityLog - timestamped status lines
//!
//! The pipeline reports progress as short human-readable lines
//! (`Watching ...`, `Uploading ...`, `Uploaded ...`, `Upload failed: ...`).
//! `ActivityLog` keeps the most recent lines in a bounded buffer and forwards
//! each one to `tracing` at the matching level. Recording never fails and
//! never blocks on I/O.

use std::collections::VecDeque;
use std::fmt::{self, Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use serde::Serialize;

/// Default number of lines retained
pub const DEFAULT_CAPACITY: usize = 1000;

/// Severity of an activity line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One recorded status line
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    /// Local wall-clock time the line was recorded
    pub timestamp: DateTime<Local>,
    /// Severity
    pub level: ActivityLevel,
    /// The message text
    pub message: String,
}

impl Display for ActivityEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Bounded, thread-safe sink for status lines
///
/// Shared as `Arc<ActivityLog>` between the watcher callback, the scheduler
/// and the dispatch tasks.
#[derive(Debug)]
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    /// Creates a log that keeps at most `capacity` lines (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ActivityEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a line at `level` and forwards it to `tracing`
    pub fn record(&self, level: ActivityLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ActivityLevel::Debug => tracing::debug!(target: "uplink::activity", "{message}"),
            ActivityLevel::Info => tracing::info!(target: "uplink::activity", "{message}"),
            ActivityLevel::Warn => tracing::warn!(target: "uplink::activity", "{message}"),
            ActivityLevel::Error => tracing::error!(target: "uplink::activity", "{message}"),
        }

        let entry = ActivityEntry {
            timestamp: Local::now(),
            level,
            message,
        };
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.record(ActivityLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(ActivityLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.record(ActivityLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(ActivityLevel::Error, message);
    }

    /// Copies of all retained lines, oldest first
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Message text of all retained lines, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }

    /// Retained lines at or above `level`
    pub fn entries_at_least(&self, level: ActivityLevel) -> Vec<ActivityEntry> {
        self.lock()
            .iter()
            .filter(|e| e.level.rank() >= level.rank())
            .cloned()
            .collect()
    }

    /// Number of retained lines
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ActivityLevel {
    fn rank(self) -> u8 {
        match self {
            ActivityLevel::Debug => 0,
            ActivityLevel::Info => 1,
            ActivityLevel::Warn => 2,
            ActivityLevel::Error => 3,
        }
    }
}
