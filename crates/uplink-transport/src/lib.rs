//! Uplink Transport - compressed, multi-host HTTP delivery
//!
//! Provides:
//! - [`CompressedContent`], a gzip-encoding body wrapper that streams its
//!   output and never declares a length
//! - [`UploadClient`], a thin `reqwest` client carrying the configured
//!   timeout, user agent and TLS policy
//! - [`MultiHostDispatcher`], the [`UploadDispatcher`](uplink_core::ports::UploadDispatcher)
//!   implementation that posts one file to every configured host in order
//!
//! ## Modules
//!
//! - [`encoder`] - transfer encoder
//! - [`client`] - HTTP client
//! - [`dispatcher`] - per-host delivery loop and status logging

pub mod client;
pub mod dispatcher;
pub mod encoder;

use thiserror::Error;

pub use client::UploadClient;
pub use dispatcher::MultiHostDispatcher;
pub use encoder::CompressedContent;

/// Errors that can occur while setting up the transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed (TLS backend, invalid header value)
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// The configured host list is unusable
    #[error(transparent)]
    Hosts(#[from] uplink_core::domain::DomainError),
}
