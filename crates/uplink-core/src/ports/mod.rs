//! Port definitions
//!
//! - [`UploadDispatcher`] - delivers one file to every configured host. The
//!   sync crate's scheduler drives it; the transport crate implements it.

pub mod dispatcher;

pub use dispatcher::UploadDispatcher;
