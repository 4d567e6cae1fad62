//! Upload command - one-shot dispatch outside the daemon
//!
//! `uplink upload [FILE]` sends a file to every configured host exactly as
//! the daemon would, printing one line per host. Without `FILE`, the most
//! recently modified collector file under the watch directory is used.
//!
//! The command succeeds whenever the file could be read and the host loop ran;
//! rejected or unreachable hosts are reported, not fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};
use uplink_audit::ActivityLog;
use uplink_core::domain::WatchTarget;
use uplink_core::ports::UploadDispatcher;
use uplink_core::{Config, ConfigStore};
use uplink_transport::MultiHostDispatcher;

use crate::output::{get_formatter, print_report, report_json, OutputFormat};

/// Upload arguments
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// File to upload (defaults to the newest collector file in the watch directory)
    pub file: Option<PathBuf>,
}

impl UploadCommand {
    /// Execute the upload command
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let config = Config::load(config_path)?;

        let file = match &self.file {
            Some(file) => file.clone(),
            None => {
                let target = config.watch_target();
                find_collector_file(&target)?.with_context(|| {
                    format!(
                        "No {} found under {}",
                        target.filename(),
                        target.directory().display()
                    )
                })?
            }
        };
        info!(file = %file.display(), "Uploading once");

        let store = ConfigStore::in_memory(config);
        let activity = Arc::new(ActivityLog::default());
        let dispatcher = MultiHostDispatcher::new(store, activity)
            .context("Failed to build upload dispatcher")?;

        let report = dispatcher.upload(&file).await?;

        if format.is_json() {
            formatter.print_json(&report_json(&report));
        } else {
            formatter.info(&format!("File: {}", report.relative_path.display()));
            print_report(formatter.as_ref(), &report);
            if report.failed() > 0 {
                formatter.warn(&format!(
                    "{} of {} hosts did not accept the upload",
                    report.failed(),
                    report.attempts()
                ));
            }
        }

        Ok(())
    }
}

/// Finds the most recently modified file matching `target` under its directory
///
/// Descends into subdirectories only when the target is recursive. Returns
/// `Ok(None)` if nothing matches.
///
/// # Errors
/// Returns an error if the watch directory itself cannot be read.
pub fn find_collector_file(target: &WatchTarget) -> Result<Option<PathBuf>> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    let mut pending = vec![target.directory().to_path_buf()];
    let mut is_root = true;

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if is_root => {
                return Err(e)
                    .with_context(|| format!("Failed to read watch directory {}", dir.display()))
            }
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };
        is_root = false;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                if target.recursive() {
                    pending.push(path);
                }
            } else if target.matches(&path) {
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                    newest = Some((modified, path));
                }
            }
        }
    }

    Ok(newest.map(|(_, path)| path))
}
