//! Uplink CLI - Command-line interface for Uplink
//!
//! Provides commands for:
//! - Viewing, editing and validating the configuration
//! - Uploading the collector file once, outside the daemon

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uplink_core::Config;

mod commands;
mod output;

use commands::{config::ConfigCommand, upload::UploadCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "uplink", version, about = "Upload addon data to one or more hosts")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Upload a file to every configured host now
    Upload(UploadCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = OutputFormat::from_json_flag(cli.json);
    let config_path = cli.config.unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
        Commands::Upload(cmd) => cmd.execute(&config_path, format).await,
    }
}
