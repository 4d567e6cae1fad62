//! Uplink Daemon - background upload service
//!
//! This binary runs as a user service and handles:
//! - Watching the collector file inside the configured game folder
//! - Debounced, gated upload of every change to all configured hosts
//! - Full rewatch whenever the watch settings change
//! - Configuration reload on SIGHUP
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon builds an [`UploadPipeline`] around a [`MultiHostDispatcher`],
//! starts the pipeline's scheduler, then waits on configuration changes. The
//! loop is controlled by a `CancellationToken` that is triggered on receipt
//! of SIGTERM or SIGINT.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use uplink_audit::{ActivityLevel, ActivityLog};
use uplink_core::config::{ConfigSource, WatchConfig};
use uplink_core::domain::WatchTarget;
use uplink_core::{Config, ConfigStore};
use uplink_sync::{UploadPipeline, WatchStatus};
use uplink_transport::MultiHostDispatcher;

/// Command-line arguments for `uplinkd`
#[derive(Debug, Parser)]
#[command(name = "uplinkd", version, about = "Uplink background upload daemon")]
struct Args {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// DaemonService struct
// ============================================================================

/// Main daemon service that owns the upload pipeline
///
/// Holds the configuration store, the activity log, the pipeline and a
/// cancellation token for graceful shutdown.
struct DaemonService {
    /// File the configuration is loaded from and persisted to
    config_path: PathBuf,
    /// Live configuration shared with the dispatcher
    store: ConfigStore,
    /// Status-line sink shared with the pipeline
    activity: Arc<ActivityLog>,
    /// Watcher, queue, gate and scheduler
    pipeline: UploadPipeline,
    /// Token for signalling graceful shutdown to all async tasks
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Creates a new DaemonService
    ///
    /// Loads (or recreates) the configuration and builds the pipeline. Does
    /// not start watching; [`run`](Self::run) does that.
    fn new(config_path: PathBuf, shutdown: CancellationToken) -> Result<Self> {
        let activity = Arc::new(ActivityLog::default());

        activity.info(format!("Loading config from {}", config_path.display()));
        let (config, source) = Config::load_or_recreate(&config_path);
        if let ConfigSource::Recreated { reason } = &source {
            warn!(path = %config_path.display(), reason = %reason, "Configuration recreated");
            activity.error("ERROR: unable to load config, recreating");
        }
        for issue in config.validate() {
            warn!(field = %issue.field, message = %issue.message, "Configuration problem");
        }

        let store = ConfigStore::file_backed(config.clone(), config_path.clone());
        let dispatcher = MultiHostDispatcher::new(store.clone(), Arc::clone(&activity))
            .context("Failed to build upload dispatcher")?;
        info!(hosts = dispatcher.hosts().len(), "Upload hosts fixed for this run");

        let pipeline = UploadPipeline::new(&config, Arc::new(dispatcher), Arc::clone(&activity))
            .context("Failed to build upload pipeline")?;

        Ok(Self {
            config_path,
            store,
            activity,
            pipeline,
            shutdown,
        })
    }

    // ========================================================================
    // DaemonService::run() - async main loop
    // ========================================================================

    /// Runs the daemon's main loop
    ///
    /// 1. Starts the upload scheduler
    /// 2. Attempts the initial watch
    /// 3. Rewatches whenever the watch settings change, until shutdown
    async fn run(&mut self) -> Result<()> {
        let scheduler = self.pipeline.spawn_scheduler(self.shutdown.child_token());

        #[cfg(unix)]
        spawn_reload_listener(
            self.config_path.clone(),
            self.store.clone(),
            self.shutdown.child_token(),
        )?;

        let shutdown = self.shutdown.clone();
        let mut changes = self.store.subscribe();
        let initial = self.store.snapshot();
        let mut current = initial.watch.clone();
        self.apply_watch(&initial);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping daemon loop");
                    break;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        warn!("Configuration store closed");
                        break;
                    }
                    let config = changes.borrow_and_update().clone();
                    if timing_changed(&current, &config.watch) {
                        warn!(
                            quiet_period_ms = config.watch.quiet_period_ms,
                            poll_interval_ms = config.watch.poll_interval_ms,
                            "Watch timing changed, takes effect after restart"
                        );
                    }
                    if target_changed(&current, &config.watch) {
                        info!("Watch settings changed, rewatching");
                        self.apply_watch(&config);
                    } else {
                        debug!("Configuration changed without affecting the watch");
                    }
                    current = config.watch.clone();
                }
            }
        }

        self.pipeline.unwatch();
        if let Err(e) = scheduler.await {
            error!(error = %e, "Upload scheduler task failed");
        }

        info!(
            activity_lines = self.activity.len(),
            problems = self.activity.entries_at_least(ActivityLevel::Warn).len(),
            queued = self.pipeline.queue().len(),
            "Daemon loop finished"
        );
        Ok(())
    }

    /// Drops the current watcher and watches the target described by `config`
    fn apply_watch(&mut self, config: &Config) -> WatchStatus {
        if config.watch.wow_folder.as_os_str().is_empty() {
            self.pipeline.unwatch();
            self.activity.error("ERROR: invalid WoW folder");
            return WatchStatus::InvalidFolder;
        }
        let target: WatchTarget = config.watch_target();
        self.pipeline.watch(target)
    }
}

/// True when the watched directory, file name or recursion differ
fn target_changed(old: &WatchConfig, new: &WatchConfig) -> bool {
    old.wow_folder != new.wow_folder
        || old.subdirectory != new.subdirectory
        || old.filename != new.filename
        || old.recursive != new.recursive
}

/// Debounce and poll timings are fixed when the pipeline is built
fn timing_changed(old: &WatchConfig, new: &WatchConfig) -> bool {
    old.quiet_period_ms != new.quiet_period_ms || old.poll_interval_ms != new.poll_interval_ms
}

// ============================================================================
// SIGHUP reload
// ============================================================================

/// Re-reads the configuration file into `store` on every SIGHUP
///
/// A file that fails to load leaves the current configuration in place.
#[cfg(unix)]
fn spawn_reload_listener(
    path: PathBuf,
    store: ConfigStore,
    shutdown: CancellationToken,
) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    info!(path = %path.display(), "Received SIGHUP, reloading configuration");
                    reload_config(&path, &store);
                }
            }
        }
    });
    Ok(())
}

/// Loads `path` and installs it into `store` without writing it back
fn reload_config(path: &std::path::Path, store: &ConfigStore) -> bool {
    match Config::load(path) {
        Ok(config) => {
            store.replace(config);
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{e:#}"), "Reload failed, keeping current configuration");
            false
        }
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
///
/// If a handler cannot be installed, that signal is ignored and the other
/// one still works.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(Config::default_path);

    // The configured level applies unless RUST_LOG is set.
    let level = Config::load_or_default(&config_path).logging.level;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!("Uplink daemon starting (uplinkd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let mut service = DaemonService::new(config_path, shutdown_token.clone())?;

    let result = service.run().await;

    match &result {
        Ok(()) => info!("Uplink daemon shut down gracefully"),
        Err(e) => error!(error = %e, "Uplink daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
