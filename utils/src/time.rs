//! Time formatting helpers.

/// Format a monotonic duration in milliseconds to a human-readable string.
///
/// Sub-second values keep millisecond precision; longer spans round down to
/// whole seconds, which is what log lines about sampling windows need.
pub fn format_millis(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{ms}ms");
    }
    let secs = ms / 1_000;
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
