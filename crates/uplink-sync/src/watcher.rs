//! File watching filtered to a single file name
//!
//! Provides a [`FileWatcher`] that wraps the `notify` crate to monitor the
//! [`WatchTarget`] directory, converting raw OS events into [`ChangeEvent`]
//! values and handing the ones that name the watched file to a callback.
//!
//! ## Architecture
//!
//! ```text
//! inotify / FSEvents / ReadDirectoryChangesW
//!       │  (notify thread)
//!       ▼
//!  FileWatcher ── filename filter ──→ on_change ──→ ChangeDebouncer::schedule
//! ```
//!
//! The callback runs on the notify thread and must not block.

use std::path::{Path, PathBuf};

use notify::event::{MetadataKind, ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, trace};
use uplink_core::domain::WatchTarget;

use crate::SyncError;

// ============================================================================
// ChangeEvent
// ============================================================================

/// A filesystem change that may warrant an upload
///
/// Deletions are not represented: a removed file has nothing to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A file was created at the given path
    Created(PathBuf),
    /// A file's content or write metadata changed
    Modified(PathBuf),
    /// A file was renamed or moved to `to`
    Renamed {
        /// The original path, when the backend reports it
        from: Option<PathBuf>,
        /// The new path
        to: PathBuf,
    },
}

impl ChangeEvent {
    /// Returns the path the change leaves behind
    ///
    /// For rename events, this returns the destination path.
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) => p,
            ChangeEvent::Renamed { to, .. } => to,
        }
    }

    /// Consumes the event, returning [`path`](Self::path)
    pub fn into_path(self) -> PathBuf {
        match self {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) => p,
            ChangeEvent::Renamed { to, .. } => to,
        }
    }
}

// ============================================================================
// FileWatcher
// ============================================================================

/// Watches a [`WatchTarget`] using the OS-native mechanism
///
/// Dropping the watcher stops watching. A new target always means a new
/// `FileWatcher`; there is no in-place retargeting.
///
/// ## Usage
///
/// ```ignore
/// let watcher = FileWatcher::start(target, |change| debouncer.schedule(change.into_path()))?;
/// // ...
/// drop(watcher); // stops watching
/// ```
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    target: WatchTarget,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Starts watching `target`, invoking `on_change` for each matching event
    ///
    /// # Errors
    /// Returns [`SyncError::DirectoryNotFound`] if the target directory does
    /// not exist, or [`SyncError::Watch`] if the OS watcher cannot be created
    /// or attached (permissions, watch limits).
    pub fn start<F>(target: WatchTarget, mut on_change: F) -> Result<Self, SyncError>
    where
        F: FnMut(ChangeEvent) + Send + 'static,
    {
        if !target.exists() {
            return Err(SyncError::DirectoryNotFound(target.directory().to_path_buf()));
        }

        let filter = target.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let Some(change) = map_notify_event(&event) else {
                        return;
                    };
                    if filter.matches(change.path()) {
                        on_change(change);
                    } else {
                        trace!(path = %change.path().display(), "Ignoring non-matching file");
                    }
                }
                Err(err) => {
                    error!(error = %err, "File watcher error");
                }
            },
            notify::Config::default(),
        )?;

        let mode = if target.recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(target.directory(), mode)?;

        info!(
            path = %target.directory().display(),
            filename = target.filename(),
            recursive = target.recursive(),
            "Started watch"
        );

        Ok(Self { watcher, target })
    }

    /// The target being watched
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Stops watching explicitly, reporting any error from the backend
    ///
    /// Dropping the watcher has the same effect but swallows errors.
    pub fn stop(mut self) -> Result<(), SyncError> {
        info!(path = %self.target.directory().display(), "Stopping watch");
        self.watcher.unwatch(self.target.directory())?;
        Ok(())
    }
}

// ============================================================================
// Event mapping - notify::Event → ChangeEvent
// ============================================================================

/// Converts a `notify::Event` into a [`ChangeEvent`]
///
/// Maps the notify event kinds as follows:
/// - `Create(*)` -> `Created`
/// - `Modify(Data(*))`, `Modify(Any)`, `Modify(Metadata(*))` except access
///   time -> `Modified`
/// - `Modify(Name(Both))` with 2 paths -> `Renamed { from: Some, to }`
/// - `Modify(Name(To | Any))` -> `Renamed { from: None, to }`
///
/// Returns `None` for removals, rename sources, access events and events
/// without paths.
fn map_notify_event(event: &notify::Event) -> Option<ChangeEvent> {
    let paths = &event.paths;

    match &event.kind {
        EventKind::Create(_) => {
            let path = paths.first()?;
            debug!(path = %path.display(), "Mapped Create event");
            Some(ChangeEvent::Created(path.clone()))
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if paths.len() >= 2 {
                debug!(
                    from = %paths[0].display(),
                    to = %paths[1].display(),
                    "Mapped Rename event"
                );
                Some(ChangeEvent::Renamed {
                    from: Some(paths[0].clone()),
                    to: paths[1].clone(),
                })
            } else {
                let to = paths.first()?;
                Some(ChangeEvent::Renamed {
                    from: None,
                    to: to.clone(),
                })
            }
        }

        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => {
            let to = paths.last()?;
            debug!(to = %to.display(), "Mapped rename-to event");
            Some(ChangeEvent::Renamed {
                from: None,
                to: to.clone(),
            })
        }

        EventKind::Modify(ModifyKind::Name(_)) => {
            debug!(kind = ?event.kind, "Ignoring rename source");
            None
        }

        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => None,

        EventKind::Modify(_) => {
            let path = paths.first()?;
            debug!(path = %path.display(), kind = ?event.kind, "Mapped Modify event");
            Some(ChangeEvent::Modified(path.clone()))
        }

        _ => {
            trace!(kind = ?event.kind, "Ignoring event kind");
            None
        }
    }
}
