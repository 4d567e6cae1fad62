//! Integration tests for uplink-transport
//!
//! Uses wiremock servers as stand-in upload hosts and verifies the wire
//! format, per-host isolation and status lines of the dispatcher, plus the
//! full watch-to-upload path through the sync crate.

mod common;

mod test_dispatch;
mod test_pipeline;
