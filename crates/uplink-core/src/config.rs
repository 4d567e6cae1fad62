//! Configuration module for Uplink.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, recovery, validation, defaults, and a builder pattern for
//! programmatic use.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{errors::DomainError, HostList, WatchTarget};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Uplink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upload: UploadConfig,
    pub watch: WatchConfig,
    pub logging: LoggingConfig,
}

/// Upload endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// API key sent with every upload.
    pub api_key: String,
    /// Ordered list of base URLs; every upload is posted to each of them.
    pub hosts: Vec<String>,
    /// Per-request timeout in seconds, applied independently to each host.
    pub timeout_secs: u64,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Skip TLS certificate verification (local development servers only).
    pub accept_invalid_certs: bool,
}

/// Filesystem watch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Root game folder chosen by the user.
    pub wow_folder: PathBuf,
    /// Directory beneath `wow_folder` that is actually watched.
    pub subdirectory: PathBuf,
    /// Exact file name to react to.
    pub filename: String,
    /// Whether subdirectories of the watched directory are included.
    pub recursive: bool,
    /// Milliseconds each change waits before it is queued for upload.
    pub quiet_period_ms: u64,
    /// Milliseconds between upload queue polls.
    pub poll_interval_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading and saving
// ---------------------------------------------------------------------------

/// How [`Config::load_or_recreate`] obtained its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// The file existed and parsed cleanly.
    Loaded,
    /// The file was missing or corrupt; defaults were substituted and written back.
    Recreated {
        /// Why the original file could not be used.
        reason: String,
    },
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Load from `path`, replacing a missing or corrupt file with defaults.
    ///
    /// The defaults are persisted immediately. A failure to persist them is
    /// logged and otherwise ignored; the in-memory defaults are still returned.
    pub fn load_or_recreate(path: &Path) -> (Self, ConfigSource) {
        match Self::load(path) {
            Ok(config) => (config, ConfigSource::Loaded),
            Err(e) => {
                let config = Config::default();
                if let Err(save_err) = config.save(path) {
                    warn!(
                        path = %path.display(),
                        error = %save_err,
                        "Failed to persist default configuration"
                    );
                }
                (
                    config,
                    ConfigSource::Recreated {
                        reason: format!("{e:#}"),
                    },
                )
            }
        }
    }

    /// Serialize to YAML and write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create configuration directory {}", parent.display())
            })?;
        }
        let yaml = serde_yaml::to_string(self).context("Failed to serialize configuration")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/uplink/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("uplink")
            .join("config.yaml")
    }

    /// The watch target described by the `watch` section.
    pub fn watch_target(&self) -> WatchTarget {
        WatchTarget::from_config(&self.watch)
    }

    /// The ordered upload host list described by `upload.hosts`.
    pub fn host_list(&self) -> Result<HostList, DomainError> {
        HostList::parse(&self.upload.hosts)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Production upload host.
pub const DEFAULT_HOST: &str = "https://wowthing.org";

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = "WowthingAutoUploader";

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            hosts: vec![DEFAULT_HOST.to_string()],
            timeout_secs: 20,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            wow_folder: PathBuf::new(),
            subdirectory: PathBuf::from("_retail_").join("WTF").join("Account"),
            filename: "WoWthing_Collector.lua".to_string(),
            recursive: true,
            quiet_period_ms: 2000,
            poll_interval_ms: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"upload.timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. The watch folder is
    /// deliberately not checked here: a missing folder is a runtime condition
    /// reported when the watch starts.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- upload ---
        if self.upload.hosts.is_empty() {
            errors.push(ValidationError {
                field: "upload.hosts".into(),
                message: "at least one host is required".into(),
            });
        }
        for (index, host) in self.upload.hosts.iter().enumerate() {
            if let Err(e) = crate::domain::HostUrl::parse(host) {
                errors.push(ValidationError {
                    field: format!("upload.hosts[{index}]"),
                    message: e.to_string(),
                });
            }
        }
        if self.upload.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "upload.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.upload.user_agent.trim().is_empty() {
            errors.push(ValidationError {
                field: "upload.user_agent".into(),
                message: "must not be empty".into(),
            });
        }

        // --- watch ---
        if self.watch.filename.trim().is_empty() {
            errors.push(ValidationError {
                field: "watch.filename".into(),
                message: "must not be empty".into(),
            });
        }
        if self.watch.quiet_period_ms == 0 {
            errors.push(ValidationError {
                field: "watch.quiet_period_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.watch.poll_interval_ms == 0 {
            errors.push(ValidationError {
                field: "watch.poll_interval_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use uplink_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .api_key("secret")
///     .wow_folder("/games/wow")
///     .hosts(["https://example.org"])
///     .build();
/// assert_eq!(config.upload.hosts.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- upload ---

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.upload.api_key = key.into();
        self
    }

    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.upload.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout_secs(mut self, seconds: u64) -> Self {
        self.config.upload.timeout_secs = seconds;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.upload.user_agent = agent.into();
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.config.upload.accept_invalid_certs = accept;
        self
    }

    // --- watch ---

    pub fn wow_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.watch.wow_folder = folder.into();
        self
    }

    pub fn subdirectory(mut self, subdirectory: impl Into<PathBuf>) -> Self {
        self.config.watch.subdirectory = subdirectory.into();
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.config.watch.filename = filename.into();
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.watch.recursive = recursive;
        self
    }

    pub fn quiet_period_ms(mut self, ms: u64) -> Self {
        self.config.watch.quiet_period_ms = ms;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.watch.poll_interval_ms = ms;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.upload.api_key, "");
        assert_eq!(cfg.upload.hosts, vec!["https://wowthing.org".to_string()]);
        assert_eq!(cfg.upload.timeout_secs, 20);
        assert_eq!(cfg.upload.user_agent, "WowthingAutoUploader");
        assert!(!cfg.upload.accept_invalid_certs);
        assert_eq!(cfg.watch.filename, "WoWthing_Collector.lua");
        assert_eq!(
            cfg.watch.subdirectory,
            PathBuf::from("_retail_").join("WTF").join("Account")
        );
        assert!(cfg.watch.recursive);
        assert_eq!(cfg.watch.quiet_period_ms, 2000);
        assert_eq!(cfg.watch.poll_interval_ms, 500);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
upload:
  api_key: abc123
  hosts:
    - https://localhost:55501
    - https://wowthing.org
  timeout_secs: 5
  user_agent: TestAgent
  accept_invalid_certs: true
watch:
  wow_folder: /games/wow
  subdirectory: _classic_/WTF/Account
  filename: Other.lua
  recursive: false
  quiet_period_ms: 100
  poll_interval_ms: 50
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.upload.api_key, "abc123");
        assert_eq!(cfg.upload.hosts.len(), 2);
        assert_eq!(cfg.upload.hosts[0], "https://localhost:55501");
        assert_eq!(cfg.upload.timeout_secs, 5);
        assert_eq!(cfg.upload.user_agent, "TestAgent");
        assert!(cfg.upload.accept_invalid_certs);
        assert_eq!(cfg.watch.wow_folder, PathBuf::from("/games/wow"));
        assert_eq!(cfg.watch.subdirectory, PathBuf::from("_classic_/WTF/Account"));
        assert_eq!(cfg.watch.filename, "Other.lua");
        assert!(!cfg.watch.recursive);
        assert_eq!(cfg.watch.quiet_period_ms, 100);
        assert_eq!(cfg.watch.poll_interval_ms, 50);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"upload:\n  api_key: only-key\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).unwrap();
        assert_eq!(cfg.upload.api_key, "only-key");
        assert_eq!(cfg.upload.timeout_secs, 20);
        assert_eq!(cfg.watch.filename, "WoWthing_Collector.lua");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"upload: [not, a, mapping").unwrap();
        tmp.flush().unwrap();
        assert!(Config::load(tmp.path()).is_err());
    }

    #[test]
    fn load_or_recreate_persists_defaults_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let (cfg, source) = Config::load_or_recreate(&path);
        assert_eq!(cfg, Config::default());
        assert!(matches!(source, ConfigSource::Recreated { .. }));
        assert!(path.exists(), "defaults should be written back");

        let (reloaded, source) = Config::load_or_recreate(&path);
        assert_eq!(reloaded, Config::default());
        assert_eq!(source, ConfigSource::Loaded);
    }

    #[test]
    fn load_or_recreate_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "upload: [broken").unwrap();

        let (cfg, source) = Config::load_or_recreate(&path);
        assert_eq!(cfg, Config::default());
        match source {
            ConfigSource::Recreated { reason } => assert!(reason.contains("parse")),
            other => panic!("expected Recreated, got {other:?}"),
        }
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let cfg = ConfigBuilder::new()
            .api_key("k")
            .wow_folder("/w")
            .hosts(["http://a.test", "http://b.test"])
            .build();

        cfg.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), cfg);
    }

    // -- Validation --

    #[test]
    fn validate_catches_empty_hosts() {
        let cfg = ConfigBuilder::new().hosts(Vec::<String>::new()).build();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "upload.hosts"));
    }

    #[test]
    fn validate_catches_malformed_host() {
        let cfg = ConfigBuilder::new()
            .hosts(["https://ok.test", "not a url", "ftp://files.test"])
            .build();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["upload.hosts[1]", "upload.hosts[2]"]);
    }

    #[test]
    fn validate_catches_zero_timeout_and_intervals() {
        let cfg = ConfigBuilder::new()
            .timeout_secs(0)
            .quiet_period_ms(0)
            .poll_interval_ms(0)
            .build();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"upload.timeout_secs".to_string()));
        assert!(fields.contains(&"watch.quiet_period_ms".to_string()));
        assert!(fields.contains(&"watch.poll_interval_ms".to_string()));
    }

    #[test]
    fn validate_catches_empty_filename() {
        let cfg = ConfigBuilder::new().filename("  ").build();
        assert!(cfg.validate().iter().any(|e| e.field == "watch.filename"));
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let cfg = ConfigBuilder::new().logging_level("verbose").build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "logging.level");
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let cfg = ConfigBuilder::new().logging_level(*level).build();
            assert!(cfg.validate().is_empty(), "level {level} should be valid");
        }
    }

    // -- Builder --

    #[test]
    fn builder_starts_from_defaults() {
        assert_eq!(ConfigBuilder::new().build(), Config::default());
    }

    #[test]
    fn builder_build_validated_reports_errors() {
        let result = ConfigBuilder::new().timeout_secs(0).build_validated();
        let errors = result.unwrap_err();
        assert_eq!(errors[0].field, "upload.timeout_secs");
    }

    #[test]
    fn watch_target_joins_folder_and_subdirectory() {
        let cfg = ConfigBuilder::new()
            .wow_folder("/games/wow")
            .subdirectory("_retail_/WTF/Account")
            .build();
        let target = cfg.watch_target();
        assert_eq!(
            target.directory(),
            Path::new("/games/wow/_retail_/WTF/Account")
        );
        assert_eq!(target.filename(), "WoWthing_Collector.lua");
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "upload.timeout_secs".into(),
            message: "must be greater than 0".into(),
        };
        assert_eq!(err.to_string(), "upload.timeout_secs: must be greater than 0");
    }
}
