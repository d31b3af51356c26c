//! Timezone handling utilities
//!
//! Provides functions for parsing timezones and for mapping the calendar's
//! local wall-clock grid (days, hour slots) onto UTC instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CalendarError, CalendarResult};
use crate::time_range::TimeRange;

/// Parse an IANA timezone string (e.g., "Asia/Singapore", "Europe/London")
///
/// # Examples
///
/// ```
/// use agenda_core::timezone::parse_timezone;
///
/// let tz = parse_timezone("America/New_York").unwrap();
/// assert_eq!(tz.name(), "America/New_York");
/// ```
pub fn parse_timezone(tz_str: &str) -> CalendarResult<Tz> {
    tz_str
        .parse::<Tz>()
        .map_err(|_| CalendarError::InvalidTimezone(tz_str.to_string()))
}

/// Resolve a local wall-clock time to a UTC instant.
///
/// Ambiguous times (the repeated hour when clocks go back) resolve to the
/// earlier instant. Times skipped by a forward transition are an error.
///
/// # Examples
///
/// ```
/// use agenda_core::timezone::{localize, parse_timezone};
/// use chrono::NaiveDate;
///
/// let tz = parse_timezone("Asia/Singapore").unwrap();
/// let local = NaiveDate::from_ymd_opt(2026, 1, 18).unwrap().and_hms_opt(12, 0, 0).unwrap();
/// let utc = localize(&tz, local).unwrap();
/// assert_eq!(utc.to_rfc3339(), "2026-01-18T04:00:00+00:00");
/// ```
pub fn localize(tz: &Tz, local: NaiveDateTime) -> CalendarResult<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(CalendarError::NonexistentLocalTime(local))
}

/// The UTC range covering `date` between two local hours (`end_hour` may be 24).
///
/// A boundary falling inside a DST gap is pushed forward by one hour, which is
/// where every zone in the tz database resumes.
pub fn day_window(date: NaiveDate, tz: &Tz, start_hour: u32, end_hour: u32) -> CalendarResult<TimeRange> {
    let boundary = |hour: u32| -> CalendarResult<DateTime<Utc>> {
        let local = date.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(hour));
        localize(tz, local).or_else(|_| localize(tz, local + TimeDelta::hours(1)))
    };

    TimeRange::new(boundary(start_hour)?, boundary(end_hour)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_parse_timezone_invalid() {
        let tz = parse_timezone("Invalid/Timezone");
        match tz {
            Err(CalendarError::InvalidTimezone(s)) => {
                assert_eq!(s, "Invalid/Timezone");
            }
            _ => panic!("Expected InvalidTimezone error"),
        }
    }

    #[test]
    fn test_localize_singapore_noon() {
        let tz = parse_timezone("Asia/Singapore").unwrap();
        let local = NaiveDate::from_ymd_opt(2026, 1, 18)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let utc = localize(&tz, local).unwrap();

        assert_eq!(utc, Utc.with_ymd_and_hms(2026, 1, 18, 4, 0, 0).unwrap());
        assert_eq!(utc.with_timezone(&tz).hour(), 12);
    }

    #[test]
    fn test_localize_spring_forward_gap() {
        let tz = parse_timezone("America/New_York").unwrap();
        // 2026-03-08 02:30 does not exist in New York
        let gap = NaiveDate::from_ymd_opt(2026, 3, 8)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(matches!(
            localize(&tz, gap),
            Err(CalendarError::NonexistentLocalTime(_))
        ));
    }

    #[test]
    fn test_localize_fall_back_takes_earlier() {
        let tz = parse_timezone("America/New_York").unwrap();
        // 01:30 happens twice on 2026-11-01; the first one is EDT (UTC-4)
        let ambiguous = NaiveDate::from_ymd_opt(2026, 11, 1)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let utc = localize(&tz, ambiguous).unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_day_window_full_day() {
        let tz = parse_timezone("Europe/London").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let window = day_window(date, &tz, 0, 24).unwrap();
        // BST is UTC+1
        assert_eq!(window.start(), Utc.with_ymd_and_hms(2026, 6, 30, 23, 0, 0).unwrap());
        assert_eq!(window.duration(), TimeDelta::hours(24));
    }

    #[test]
    fn test_day_window_short_dst_day() {
        let tz = parse_timezone("America/New_York").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let window = day_window(date, &tz, 0, 24).unwrap();
        assert_eq!(window.duration(), TimeDelta::hours(23));
    }
}
