//! Uplink Core - Domain types, configuration and ports
//!
//! This crate contains the pieces shared by every other Uplink crate:
//! - **Configuration** - `Config` (YAML on disk) and the shared `ConfigStore`
//! - **Domain types** - `WatchTarget`, `PendingUpload`, `UploadPayload`,
//!   `HostList`, `DispatchReport`
//! - **Port definitions** - the `UploadDispatcher` trait implemented by the
//!   transport crate and driven by the sync crate's scheduler
//!
//! # Architecture
//!
//! The domain module has no I/O. Ports define the trait seams between the
//! watch/queue side of the pipeline and the HTTP side, so either half can be
//! exercised with a fake of the other.

pub mod config;
pub mod domain;
pub mod ports;
pub mod store;

pub use config::Config;
pub use store::ConfigStore;
