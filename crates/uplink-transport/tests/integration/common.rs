//! Shared helpers for transport integration tests
//!
//! Builds a temporary game folder containing the watched file and a
//! dispatcher whose hosts point at wiremock servers.

use std::path::PathBuf;
use std::sync::Arc;

use async_compression::tokio::bufread::GzipDecoder;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, BufReader};
use uplink_audit::ActivityLog;
use uplink_core::config::ConfigBuilder;
use uplink_core::ConfigStore;
use uplink_transport::MultiHostDispatcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";
pub const FILE_NAME: &str = "WoWthing_Collector.lua";
pub const FILE_TEXT: &str = "WWTCSaved = {\n  [\"version\"] = 1,\n}\n";

/// A temporary `<wow>/_retail_/WTF/Account/ACCOUNT/SavedVariables` tree
pub struct GameFolder {
    pub root: TempDir,
}

impl GameFolder {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(Self::saved_variables(root.path())).unwrap();
        Self { root }
    }

    fn saved_variables(root: &std::path::Path) -> PathBuf {
        root.join("_retail_")
            .join("WTF")
            .join("Account")
            .join("ACCOUNT1")
            .join("SavedVariables")
    }

    /// Path of the watched file (not necessarily created yet)
    pub fn file(&self) -> PathBuf {
        Self::saved_variables(self.root.path()).join(FILE_NAME)
    }

    /// Writes the watched file and returns its path
    pub fn write_file(&self, text: &str) -> PathBuf {
        let file = self.file();
        std::fs::write(&file, text).unwrap();
        file
    }

    /// Writes raw bytes to the watched file and returns its path
    pub fn write_bytes(&self, bytes: &[u8]) -> PathBuf {
        let file = self.file();
        std::fs::write(&file, bytes).unwrap();
        file
    }

    /// The file path relative to the watch directory
    pub fn relative(&self) -> PathBuf {
        PathBuf::from("ACCOUNT1").join("SavedVariables").join(FILE_NAME)
    }
}

/// Starts a mock host answering `POST /api/upload` with `status` and `body`
pub async fn mock_host(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

/// Config store for `folder` delivering to `hosts`
pub fn store(folder: &GameFolder, hosts: Vec<String>, timeout_secs: u64) -> ConfigStore {
    let config = ConfigBuilder::new()
        .api_key(API_KEY)
        .hosts(hosts)
        .timeout_secs(timeout_secs)
        .wow_folder(folder.root.path())
        .quiet_period_ms(50)
        .poll_interval_ms(50)
        .build();
    ConfigStore::in_memory(config)
}

/// Dispatcher plus its activity log
pub fn dispatcher(store: ConfigStore) -> (MultiHostDispatcher, Arc<ActivityLog>) {
    let activity = Arc::new(ActivityLog::default());
    let dispatcher = MultiHostDispatcher::new(store, Arc::clone(&activity)).unwrap();
    (dispatcher, activity)
}

/// Decompresses a gzip request body
pub async fn gunzip(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzipDecoder::new(BufReader::new(body))
        .read_to_end(&mut out)
        .await
        .unwrap();
    out
}
