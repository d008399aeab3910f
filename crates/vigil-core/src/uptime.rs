//! Human-readable uptime rendering.

use std::time::Duration;

/// Format an uptime as `"3h 42m"`, or `"42m"` under an hour.
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
