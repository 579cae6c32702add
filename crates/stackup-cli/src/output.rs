//! Formatted output helpers for CLI commands.
//!
//! Terminal styling, status markers, and human-readable durations.

use stackup_common::types::{PortMapping, ServiceState};

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const CYAN: &str = "\x1b[36m";
pub const YELLOW: &str = "\x1b[33m";
pub const RESET: &str = "\x1b[0m";

/// Colored bullet for a service state.
#[must_use]
pub const fn state_marker(state: ServiceState) -> &'static str {
    match state {
        ServiceState::Running => "\x1b[32m\u{25cf}\x1b[0m",
        ServiceState::Failed => "\x1b[31m\u{25cf}\x1b[0m",
        ServiceState::Starting | ServiceState::Stopping => "\x1b[33m\u{25cf}\x1b[0m",
        ServiceState::Pending | ServiceState::Stopped => "\x1b[2m\u{25cb}\x1b[0m",
    }
}

/// Comma-separated port list, or `-` when there are none.
#[must_use]
pub fn format_ports(ports: &[PortMapping]) -> String {
    if ports.is_empty() {
        return "-".to_string();
    }
    ports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats a duration in seconds into a compact string (e.g., "2h 5m").
#[must_use]
pub fn format_uptime(seconds: i64) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = MINUTE * 60;
    const DAY: i64 = HOUR * 24;

    let seconds = seconds.max(0);
    if seconds >= DAY {
        format!("{}d {}h", seconds / DAY, (seconds % DAY) / HOUR)
    } else if seconds >= HOUR {
        format!("{}h {}m", seconds / HOUR, (seconds % HOUR) / MINUTE)
    } else if seconds >= MINUTE {
        format!("{}m {}s", seconds / MINUTE, seconds % MINUTE)
    } else {
        format!("{seconds}s")
    }
}

/// Time since an RFC 3339 timestamp, or `-` if it cannot be parsed.
#[must_use]
pub fn uptime_since(rfc3339: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(rfc3339).map_or_else(
        |_| "-".to_string(),
        |started| {
            let elapsed = chrono::Utc::now().signed_duration_since(started);
            format_uptime(elapsed.num_seconds())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_displays_seconds() {
        assert_eq!(format_uptime(42), "42s");
    }

    #[test]
    fn format_uptime_displays_minutes() {
        assert_eq!(format_uptime(125), "2m 5s");
    }

    #[test]
    fn format_uptime_displays_hours() {
        assert_eq!(format_uptime(7_500), "2h 5m");
    }

    #[test]
    fn format_uptime_displays_days() {
        assert_eq!(format_uptime(90_000), "1d 1h");
    }

    #[test]
    fn format_uptime_clamps_negative() {
        assert_eq!(format_uptime(-5), "0s");
    }

    #[test]
    fn uptime_since_rejects_garbage() {
        assert_eq!(uptime_since("yesterday"), "-");
    }

    #[test]
    fn ports_are_joined() {
        assert_eq!(format_ports(&[]), "-");
        assert_eq!(
            format_ports(&[PortMapping::tcp(5432, 5432), "53:53/udp".parse().unwrap()]),
            "5432:5432, 53:53/udp"
        );
    }
}
