// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, NaiveDate, Utc};

/// Current time as whole seconds since the Unix epoch.
pub fn now_unix_secs() -> i64 {
    Utc::now().timestamp()
}

/// Short label used next to a notification, e.g. `Mar 4, 09:30`.
pub fn format_notification_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %H:%M").to_string()
}

/// Format a calendar date as the backend expects it (`YYYY-MM-DD`).
pub fn format_query_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_notification_date() {
        let date = Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap();
        assert_eq!(format_notification_date(date), "Mar 4, 09:30");
    }

    #[test]
    fn test_format_query_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        assert_eq!(format_query_date(date), "2026-01-09");
    }
}
