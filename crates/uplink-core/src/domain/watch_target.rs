//! Watch target
//!
//! A [`WatchTarget`] is the directory plus file-name filter the watcher
//! observes. It is immutable; a configuration change produces a new target and
//! a full rewatch rather than an in-place update.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::WatchConfig;

/// Directory and file name filter for the filesystem watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    directory: PathBuf,
    filename: String,
    recursive: bool,
}

impl WatchTarget {
    /// Creates a target watching `directory` for files named `filename`
    pub fn new(directory: impl Into<PathBuf>, filename: impl Into<String>, recursive: bool) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            recursive,
        }
    }

    /// Derives the target from the `watch` configuration section
    ///
    /// The watched directory is `wow_folder/subdirectory`.
    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(
            config.wow_folder.join(&config.subdirectory),
            config.filename.clone(),
            config.recursive,
        )
    }

    /// The watched directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The exact file name that triggers uploads
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Whether subdirectories are included
    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Returns true if the watched directory currently exists
    pub fn exists(&self) -> bool {
        self.directory.is_dir()
    }

    /// Returns true if `path` names the watched file
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name() == Some(OsStr::new(&self.filename))
    }

    /// `path` relative to the watched directory, or `path` itself when it
    /// lies outside it
    pub fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.directory)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
