// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time formatted with [`format_utc_rfc3339`].
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Parse the calendar date of a class session.
///
/// Accepts a bare `YYYY-MM-DD` or any string starting with one, such as
/// `2024-06-01T09:00` or a full RFC3339 timestamp. Only the date is kept;
/// the time of day always comes from the class time slot.
pub fn parse_session_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parse a 24-hour `HH:MM` clock time.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_session_date("2024-06-01"), Some(expected));
        assert_eq!(parse_session_date("2024-06-01T09:00"), Some(expected));
        assert_eq!(parse_session_date("2024-06-01T09:00:00Z"), Some(expected));
        assert_eq!(parse_session_date("06/01/2024"), None);
        assert_eq!(parse_session_date("2024-6-1"), None);
    }

    #[test]
    fn test_parse_clock_time() {
        assert_eq!(
            parse_clock_time("09:30"),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(parse_clock_time("25:00"), None);
        assert_eq!(parse_clock_time("9am"), None);
    }

    #[test]
    fn test_format_uses_z_suffix() {
        let date = DateTime::from_timestamp(1_717_232_400, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2024-06-01T09:00:00Z");
    }
}
