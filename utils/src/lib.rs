//! Shared utilities for the proxima attendance engine.

pub mod logging;
pub mod time;

pub use logging::init_tracing;
pub use time::format_millis;
