//! Time formatting and calendar-window helpers

use chrono::{Datelike, Duration, NaiveDate};

/// Short duration format: `"3m 20s"`. Zero seconds renders as `"0m 0s"`.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let mins = seconds / 60;
    let secs = seconds % 60;
    format!("{mins}m {secs}s")
}

/// Long duration format: hours and minutes once an hour is reached,
/// minutes and seconds below that. Zero renders as `"0 minutes"`.
#[must_use]
pub fn format_duration_long(seconds: u64) -> String {
    if seconds == 0 {
        return "0 minutes".to_string();
    }

    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if mins > 0 {
        parts.push(format!("{mins}m"));
    }
    if secs > 0 && hours == 0 {
        parts.push(format!("{secs}s"));
    }

    if parts.is_empty() {
        "0 minutes".to_string()
    } else {
        parts.join(" ")
    }
}

/// Monday of the week containing `today`.
///
/// Sunday belongs to the week of the preceding Monday.
#[must_use]
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

/// First day of the month containing `today`.
#[must_use]
pub fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}
