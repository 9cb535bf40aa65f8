//! Size and date presentation.
//!
//! Dates are bucketed by elapsed time against an injected `now`, not by
//! calendar day: "Today" means less than 24 hours ago. Both formatters are
//! pure so they can be tested without a clock.

use chrono::{DateTime, Datelike, Local, TimeZone};

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with a base-1024 unit ladder.
///
/// Rounds to two decimals and trims trailing zeros: `0 -> "0 B"`,
/// `1024 -> "1 KB"`, `1536 -> "1.5 KB"`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let exp = (bytes.ilog2() / 10).min((UNITS.len() - 1) as u32);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = (value * 100.0).round() / 100.0;

    let mut num = format!("{rounded:.2}");
    while num.ends_with('0') {
        num.pop();
    }
    if num.ends_with('.') {
        num.pop();
    }

    format!("{num} {}", UNITS[exp as usize])
}

/// Converts an epoch-milliseconds timestamp to a local datetime.
fn to_local(timestamp_ms: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(timestamp_ms).single()
}

/// Long relative date used in list view.
pub fn format_date(timestamp_ms: i64, now: DateTime<Local>) -> String {
    if timestamp_ms == 0 {
        return "Unknown date".to_string();
    }
    let Some(date) = to_local(timestamp_ms) else {
        return "Invalid date".to_string();
    };

    let diff = now.signed_duration_since(date).abs();
    let minutes = diff.num_minutes();
    let days = diff.num_days();

    if minutes < 60 {
        return match minutes {
            0 => "Just now".to_string(),
            1 => "1 minute ago".to_string(),
            n => format!("{n} minutes ago"),
        };
    }
    if days == 0 {
        return format!("Today at {}", date.format("%-I:%M %p"));
    }
    if days == 1 {
        return "Yesterday".to_string();
    }
    if days < 7 {
        return format!("{}", date.format("%A %-I:%M %p"));
    }
    if date.year() == now.year() {
        format!("{}", date.format("%b %-d, %-I:%M %p"))
    } else {
        format!("{}", date.format("%b %-d, %Y"))
    }
}

/// Short relative date used in grid view.
pub fn format_date_short(timestamp_ms: i64, now: DateTime<Local>) -> String {
    if timestamp_ms == 0 {
        return "Unknown".to_string();
    }
    let Some(date) = to_local(timestamp_ms) else {
        return "Invalid date".to_string();
    };

    let diff = now.signed_duration_since(date).abs();
    let minutes = diff.num_minutes();
    let days = diff.num_days();

    if minutes < 60 {
        return match minutes {
            0 => "Just now".to_string(),
            n => format!("{n}m ago"),
        };
    }
    if days == 0 {
        return "Today".to_string();
    }
    if days == 1 {
        return "Yesterday".to_string();
    }
    if days < 7 {
        return format!("{days}d ago");
    }
    if date.year() == now.year() {
        format!("{}", date.format("%b %-d"))
    } else {
        format!("{}", date.format("%b %-d, %y"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fixed_now() -> DateTime<Local> {
        // Midday avoids crossing a unit boundary when tests subtract hours.
        Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn ms_ago(now: DateTime<Local>, d: Duration) -> i64 {
        (now - d).timestamp_millis()
    }

    #[test]
    fn test_format_size_documented_values() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
    }

    #[test]
    fn test_format_size_unit_ladder() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024 * 1024), "1 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5 GB");
        assert_eq!(format_size(2 * 1024u64.pow(4)), "2 TB");
    }

    #[test]
    fn test_format_size_two_decimal_rounding() {
        // 1234 / 1024 = 1.2051... -> 1.21
        assert_eq!(format_size(1234), "1.21 KB");
        // 1126 / 1024 = 1.0996... -> 1.1
        assert_eq!(format_size(1126), "1.1 KB");
    }

    #[test]
    fn test_format_size_beyond_tb_clamps_to_tb() {
        assert_eq!(format_size(1024u64.pow(5)), "1024 TB");
    }

    #[test]
    fn test_format_date_zero_is_unknown() {
        assert_eq!(format_date(0, fixed_now()), "Unknown date");
        assert_eq!(format_date_short(0, fixed_now()), "Unknown");
    }

    #[test]
    fn test_format_date_minute_buckets() {
        let now = fixed_now();
        assert_eq!(format_date(ms_ago(now, Duration::seconds(20)), now), "Just now");
        assert_eq!(
            format_date(ms_ago(now, Duration::minutes(1)), now),
            "1 minute ago"
        );
        assert_eq!(
            format_date(ms_ago(now, Duration::minutes(45)), now),
            "45 minutes ago"
        );
    }

    #[test]
    fn test_format_date_today_and_yesterday() {
        let now = fixed_now();
        let today = format_date(ms_ago(now, Duration::hours(3)), now);
        assert!(today.starts_with("Today at "), "got {today}");
        assert_eq!(format_date(ms_ago(now, Duration::hours(30)), now), "Yesterday");
    }

    #[test]
    fn test_format_date_short_buckets() {
        let now = fixed_now();
        assert_eq!(format_date_short(ms_ago(now, Duration::minutes(5)), now), "5m ago");
        assert_eq!(format_date_short(ms_ago(now, Duration::hours(3)), now), "Today");
        assert_eq!(
            format_date_short(ms_ago(now, Duration::hours(30)), now),
            "Yesterday"
        );
        assert_eq!(format_date_short(ms_ago(now, Duration::days(3)), now), "3d ago");
    }

    #[test]
    fn test_format_date_same_year_vs_other_year() {
        let now = fixed_now();
        let this_year = format_date(ms_ago(now, Duration::days(30)), now);
        assert!(this_year.starts_with("May "), "got {this_year}");
        assert!(!this_year.contains("2024"));

        let last_year = format_date(ms_ago(now, Duration::days(400)), now);
        assert!(last_year.contains("2023"), "got {last_year}");
    }
}
