//! Uplink Audit - Human-readable activity trail
//!
//! Provides:
//! - `ActivityLog`: bounded, thread-safe sink for timestamped status lines
//! - `ActivityEntry` / `ActivityLevel`: the recorded lines
//!
//! Every line recorded here is also emitted through `tracing`, so the
//! daemon's subscriber prints it while tests can inspect the buffer.

pub mod logger;

pub use logger::{ActivityEntry, ActivityLevel, ActivityLog};
