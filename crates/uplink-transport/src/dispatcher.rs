//! Multi-host dispatcher
//!
//! [`MultiHostDispatcher`] implements the [`UploadDispatcher`] port. One
//! dispatch reads the file as it is *now*, builds the JSON payload with the
//! API key from the current configuration snapshot, and POSTs it gzip-encoded
//! to `{host}/api/upload` for every configured host, in order.
//!
//! ## Per-host isolation
//!
//! Each host gets exactly one attempt and exactly one status line:
//!
//! | outcome                         | status line              |
//! |---------------------------------|--------------------------|
//! | 2xx                             | `Uploaded <relpath>`     |
//! | any other status                | `Upload failed: <body>`  |
//! | no response (connect, timeout)  | `EXCEPTION: <message>`   |
//!
//! A failure at one host never prevents the attempt at the next.
//!
//! The file is decoded leniently as UTF-8: a leading byte-order mark is
//! dropped and invalid sequences become U+FFFD, so only I/O errors stop a
//! dispatch.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uplink_audit::ActivityLog;
use uplink_core::domain::{
    DispatchReport, HostList, HostOutcome, HostResult, HostUrl, UploadError, UploadPayload,
};
use uplink_core::ports::UploadDispatcher;
use uplink_core::ConfigStore;

use crate::client::UploadClient;
use crate::encoder::CompressedContent;
use crate::TransportError;

/// Delivers a file to every host in a fixed [`HostList`]
#[derive(Debug)]
pub struct MultiHostDispatcher {
    client: UploadClient,
    hosts: HostList,
    config: ConfigStore,
    activity: Arc<ActivityLog>,
}

impl MultiHostDispatcher {
    /// Builds a dispatcher from the store's current configuration
    ///
    /// The host list and HTTP client are fixed from this snapshot for the
    /// life of the dispatcher. The API key and watch directory are re-read
    /// from the store on every dispatch.
    ///
    /// # Errors
    /// Returns [`TransportError::Hosts`] if the configured hosts are empty or
    /// invalid, or [`TransportError::ClientBuild`] if the client cannot be built.
    pub fn new(config: ConfigStore, activity: Arc<ActivityLog>) -> Result<Self, TransportError> {
        let snapshot = config.snapshot();
        let hosts = snapshot.host_list()?;
        let client = UploadClient::new(&snapshot.upload)?;
        info!(hosts = hosts.len(), "Upload dispatcher ready");
        Ok(Self::with_parts(client, hosts, config, activity))
    }

    /// Assembles a dispatcher from pre-built parts
    pub fn with_parts(
        client: UploadClient,
        hosts: HostList,
        config: ConfigStore,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            client,
            hosts,
            config,
            activity,
        }
    }

    /// The hosts every upload is delivered to
    pub fn hosts(&self) -> &HostList {
        &self.hosts
    }

    async fn deliver(&self, host: &HostUrl, content: &CompressedContent, relative: &Path) -> HostOutcome {
        let url = host.upload_url();
        let result = match self.client.post(&url, content).await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    self.activity.info(format!("Uploaded {}", relative.display()));
                    HostResult::Delivered {
                        status: status.as_u16(),
                    }
                } else {
                    match response.text().await {
                        Ok(body) => {
                            self.activity.error(format!("Upload failed: {body}"));
                            HostResult::Rejected {
                                status: status.as_u16(),
                                body,
                            }
                        }
                        Err(e) => {
                            self.activity.error(format!("EXCEPTION: {e}"));
                            HostResult::TransportFailed {
                                message: e.to_string(),
                            }
                        }
                    }
                }
            }
            Err(e) => {
                self.activity.error(format!("EXCEPTION: {e}"));
                HostResult::TransportFailed {
                    message: e.to_string(),
                }
            }
        };

        debug!(host = %host, url = %url, result = ?result, "Host attempt finished");
        HostOutcome {
            host: host.to_string(),
            url,
            result,
        }
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[async_trait]
impl UploadDispatcher for MultiHostDispatcher {
    async fn upload(&self, path: &Path) -> Result<DispatchReport, UploadError> {
        let snapshot = self.config.snapshot();
        let relative = snapshot.watch_target().relative_path(path);

        let text = match tokio::fs::read(path).await {
            Ok(bytes) => decode_text(&bytes),
            Err(source) => {
                self.activity.error(format!(
                    "ERROR: unable to read {}: {source}",
                    relative.display()
                ));
                return Err(UploadError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        if snapshot.upload.api_key.is_empty() {
            warn!("Uploading without an API key");
        }
        let json = match UploadPayload::new(snapshot.upload.api_key, text).to_json() {
            Ok(json) => json,
            Err(e) => {
                self.activity.error(format!("EXCEPTION: {e}"));
                return Err(e.into());
            }
        };

        let content = CompressedContent::json(json);
        self.activity
            .info(format!("Uploading {}...", relative.display()));

        let mut outcomes = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            outcomes.push(self.deliver(host, &content, &relative).await);
        }

        Ok(DispatchReport {
            relative_path: relative,
            outcomes,
        })
    }
}
