//! Config command - View and manage Uplink configuration
//!
//! Provides the `uplink config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the configuration file path

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;
use uplink_core::Config;

use crate::output::{get_formatter, OutputFormat};

/// Keys accepted by `uplink config set`, with a short description each
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("api_key", "API key sent with every upload"),
    ("wow_folder", "Game folder to watch"),
    ("hosts", "Comma-separated upload base URLs"),
    ("upload.timeout_secs", "Per-host request timeout"),
    ("upload.user_agent", "User-Agent header"),
    ("upload.accept_invalid_certs", "true|false"),
    ("watch.subdirectory", "Directory under wow_folder to watch"),
    ("watch.filename", "File name that triggers uploads"),
    ("watch.recursive", "true|false"),
    ("watch.quiet_period_ms", "Delay before a change is queued"),
    ("watch.poll_interval_ms", "Upload queue poll interval"),
    ("logging.level", "trace|debug|info|warn|error"),
];

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "watch.quiet_period_ms")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config_path, format),
            ConfigCommand::Set { key, value } => execute_set(config_path, key, value, format),
            ConfigCommand::Validate => execute_validate(config_path, format),
            ConfigCommand::Path => execute_path(config_path, format),
        }
    }
}

fn execute_show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", config_path.display()));
        formatter.info("");
        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_set(config_path: &Path, key: &str, value: &str, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let mut config = Config::load_or_default(config_path);

    info!(key = %key, "Setting configuration value");

    if let Err(e) = apply_config_value(&mut config, key, value) {
        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "error": e.to_string(),
            }));
        } else {
            formatter.error(&format!("Failed to set '{}': {}", key, e));
            formatter.info("");
            formatter.info("Supported keys:");
            for (name, description) in SUPPORTED_KEYS {
                formatter.info(&format!("  {name:<30} - {description}"));
            }
        }
        anyhow::bail!("configuration not changed");
    }

    let errors: Vec<String> = config.validate().iter().map(ToString::to_string).collect();
    if !errors.is_empty() {
        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "errors": errors,
            }));
        } else {
            formatter.error(&format!("Invalid value for '{}': {}", key, errors.join("; ")));
        }
        anyhow::bail!("configuration not changed");
    }

    config.save(config_path)?;

    if format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "key": key,
            "value": value,
            "config_path": config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Set {} = {}", key, value));
        formatter.info(&format!("Saved to {}", config_path.display()));
        if key.ends_with("wow_folder") && !config.watch_target().exists() {
            formatter.warn(&format!(
                "{} does not exist yet",
                config.watch_target().directory().display()
            ));
        }
    }

    Ok(())
}

fn execute_validate(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    let config = match Config::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            let message = if config_path.exists() {
                format!("Failed to parse configuration: {e:#}")
            } else {
                "Configuration file not found".to_string()
            };
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }));
            } else {
                formatter.error(&message);
                formatter.info(&format!("File: {}", config_path.display()));
            }
            anyhow::bail!("configuration is not valid");
        }
    };

    info!(config_path = %config_path.display(), "Validating configuration");

    let errors = config.validate();

    if format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", config_path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {}", config_path.display()));
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("configuration is not valid")
    }
}

fn execute_path(config_path: &Path, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        get_formatter(format).print_json(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "exists": config_path.exists(),
        }));
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => anyhow::bail!("Expected true or false for {key}"),
    }
}

/// Apply a dot-notation key/value pair to a Config struct
///
/// The short keys `api_key`, `wow_folder` and `hosts` are aliases for their
/// `upload.*` / `watch.*` forms.
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- upload ---
        "api_key" | "upload.api_key" => {
            config.upload.api_key = value.trim().to_string();
        }
        "hosts" | "upload.hosts" => {
            config.upload.hosts = value
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect();
        }
        "upload.timeout_secs" => {
            config.upload.timeout_secs = value
                .parse::<u64>()
                .context("Expected a positive integer for upload.timeout_secs")?;
        }
        "upload.user_agent" => {
            config.upload.user_agent = value.to_string();
        }
        "upload.accept_invalid_certs" => {
            config.upload.accept_invalid_certs = parse_bool(key, value)?;
        }

        // --- watch ---
        "wow_folder" | "watch.wow_folder" => {
            config.watch.wow_folder = PathBuf::from(value);
        }
        "watch.subdirectory" => {
            config.watch.subdirectory = PathBuf::from(value);
        }
        "watch.filename" => {
            config.watch.filename = value.to_string();
        }
        "watch.recursive" => {
            config.watch.recursive = parse_bool(key, value)?;
        }
        "watch.quiet_period_ms" => {
            config.watch.quiet_period_ms = value
                .parse::<u64>()
                .context("Expected a positive integer for watch.quiet_period_ms")?;
        }
        "watch.poll_interval_ms" => {
            config.watch.poll_interval_ms = value
                .parse::<u64>()
                .context("Expected a positive integer for watch.poll_interval_ms")?;
        }

        // --- logging ---
        "logging.level" => {
            config.logging.level = value.to_string();
        }

        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}
