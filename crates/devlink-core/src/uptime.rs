/// Format device uptime in seconds for display.
///
/// Seconds are dropped once the device has been up for a day.
pub fn format_uptime(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let secs = total_seconds % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else {
        format!("{minutes}m {secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(format_uptime(0), "0m 0s");
        assert_eq!(format_uptime(45), "0m 45s");
        assert_eq!(format_uptime(125), "2m 5s");
    }

    #[test]
    fn hours() {
        assert_eq!(format_uptime(3_600), "1h 0m 0s");
        assert_eq!(format_uptime(3_725), "1h 2m 5s");
        assert_eq!(format_uptime(86_399), "23h 59m 59s");
    }

    #[test]
    fn days_drop_seconds() {
        assert_eq!(format_uptime(86_400), "1d 0h 0m");
        assert_eq!(format_uptime(90_000), "1d 1h 0m");
        assert_eq!(format_uptime(3 * 86_400 + 5 * 3_600 + 7 * 60 + 59), "3d 5h 7m");
    }
}
