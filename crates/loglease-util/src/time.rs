//! Duration helpers for loglease
//!
//! CLI arguments and config values use humantime syntax (`5s`, `1m30s`);
//! log messages use the compact `1h 2m 3s` form.

use std::time::Duration;

/// Parse a humantime-style duration (`500ms`, `5s`, `1m30s`).
///
/// Used as a clap value parser and by the config layer.
pub fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

/// Format a duration in human-readable form, second precision.
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
