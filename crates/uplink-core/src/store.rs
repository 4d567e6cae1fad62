//! Shared configuration store
//!
//! [`ConfigStore`] is the handle through which the daemon, CLI and dispatcher
//! see the current configuration. Readers take a point-in-time
//! [`snapshot`](ConfigStore::snapshot) and never hold a lock across I/O.
//! Writers go through [`update`](ConfigStore::update), which persists the
//! change (for file-backed stores) and wakes every subscriber.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::debug;

use crate::config::Config;

struct Inner {
    tx: watch::Sender<Config>,
    path: Option<PathBuf>,
}

/// Cloneable handle to the live configuration
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.inner.path)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Creates a store that only lives in memory
    pub fn in_memory(config: Config) -> Self {
        Self::build(config, None)
    }

    /// Creates a store that writes every update back to `path`
    pub fn file_backed(config: Config, path: impl Into<PathBuf>) -> Self {
        Self::build(config, Some(path.into()))
    }

    fn build(config: Config, path: Option<PathBuf>) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self {
            inner: Arc::new(Inner { tx, path }),
        }
    }

    /// Returns a copy of the current configuration
    pub fn snapshot(&self) -> Config {
        self.inner.tx.borrow().clone()
    }

    /// The backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Applies `f` to the configuration, persists it, and notifies subscribers
    ///
    /// # Errors
    /// Returns an error if the store is file-backed and the file cannot be
    /// written. The in-memory value is updated regardless.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Config),
    {
        self.inner.tx.send_modify(f);
        self.persist()
    }

    /// Replaces the whole configuration (e.g. after reloading from disk)
    ///
    /// Does not write back to disk.
    pub fn replace(&self, config: Config) {
        debug!("Replacing configuration");
        self.inner.tx.send_replace(config);
    }

    /// Subscribes to configuration changes
    pub fn subscribe(&self) -> watch::Receiver<Config> {
        self.inner.tx.subscribe()
    }

    fn persist(&self) -> Result<()> {
        if let Some(path) = &self.inner.path {
            let snapshot = self.snapshot();
            snapshot.save(path)?;
            debug!(path = %path.display(), "Persisted configuration");
        }
        Ok(())
    }
}
