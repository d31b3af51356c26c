//! Half-open time ranges and grid snapping

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CalendarError, CalendarResult};

/// A half-open `[start, end)` pair of instants with `start < end`.
///
/// The invariant is enforced at construction, including deserialization, so
/// every `TimeRange` reachable from the rest of the crate is well formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = CalendarError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Build a range, rejecting `start >= end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarResult<Self> {
        if start >= end {
            return Err(CalendarError::InvalidTimeRange(format!(
                "start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a range from a start instant and a positive duration
    pub fn starting_at(start: DateTime<Utc>, duration: TimeDelta) -> CalendarResult<Self> {
        let end = start.checked_add_signed(duration).ok_or_else(|| {
            CalendarError::InvalidTimeRange("duration overflows the calendar".to_string())
        })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Whether two half-open ranges share at least one instant
    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Move the range so it starts at `start`, keeping its duration
    pub fn moved_to(&self, start: DateTime<Utc>) -> CalendarResult<Self> {
        Self::starting_at(start, self.duration())
    }

    /// The part of `self` inside `window`, if any
    pub fn clip(&self, window: &TimeRange) -> Option<TimeRange> {
        if !self.intersects(window) {
            return None;
        }
        Some(TimeRange {
            start: self.start.max(window.start),
            end: self.end.min(window.end),
        })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Round an instant to the nearest multiple of `step`, ties rounding up.
///
/// Steps are measured from the Unix epoch, so any step dividing an hour lines
/// up with wall-clock boundaries in every whole-minute UTC offset.
pub fn round_to_step(instant: DateTime<Utc>, step: TimeDelta) -> DateTime<Utc> {
    let step_ms = step.num_milliseconds();
    if step_ms <= 0 {
        return instant;
    }

    let ms = instant.timestamp_millis();
    let remainder = ms.rem_euclid(step_ms);
    let floor = ms - remainder;
    let rounded = if remainder * 2 >= step_ms {
        floor + step_ms
    } else {
        floor
    };

    DateTime::from_timestamp_millis(rounded).unwrap_or(instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_inverted_ranges() {
        assert!(TimeRange::new(at(9, 0, 0), at(9, 0, 0)).is_err());
        assert!(matches!(
            TimeRange::new(at(10, 0, 0), at(9, 0, 0)),
            Err(CalendarError::InvalidTimeRange(_))
        ));
        assert!(TimeRange::new(at(9, 0, 0), at(9, 0, 1)).is_ok());
    }

    #[test]
    fn test_half_open_intersection() {
        let a = TimeRange::new(at(9, 0, 0), at(10, 0, 0)).unwrap();
        let b = TimeRange::new(at(10, 0, 0), at(11, 0, 0)).unwrap();
        let c = TimeRange::new(at(9, 30, 0), at(10, 30, 0)).unwrap();

        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
        assert!(a.intersects(&c));
        assert!(c.intersects(&b));
    }

    #[test]
    fn test_moved_to_keeps_duration() {
        let range = TimeRange::new(at(9, 15, 0), at(10, 40, 0)).unwrap();
        let moved = range.moved_to(at(14, 0, 0)).unwrap();
        assert_eq!(moved.start(), at(14, 0, 0));
        assert_eq!(moved.duration(), range.duration());
    }

    #[test]
    fn test_clip_to_window() {
        let range = TimeRange::new(at(7, 0, 0), at(9, 30, 0)).unwrap();
        let window = TimeRange::new(at(8, 0, 0), at(18, 0, 0)).unwrap();
        let clipped = range.clip(&window).unwrap();
        assert_eq!(clipped.start(), at(8, 0, 0));
        assert_eq!(clipped.end(), at(9, 30, 0));

        let outside = TimeRange::new(at(18, 0, 0), at(19, 0, 0)).unwrap();
        assert!(outside.clip(&window).is_none());
    }

    #[test]
    fn test_round_to_five_minutes() {
        let step = TimeDelta::minutes(5);
        assert_eq!(round_to_step(at(9, 10, 0), step), at(9, 10, 0));
        assert_eq!(round_to_step(at(9, 7, 0), step), at(9, 5, 0));
        assert_eq!(round_to_step(at(9, 8, 0), step), at(9, 10, 0));
        // exact midpoint rounds up
        assert_eq!(round_to_step(at(9, 7, 30), step), at(9, 10, 0));
        assert_eq!(round_to_step(at(9, 57, 31), step), at(10, 0, 0));
    }

    #[test]
    fn test_deserialize_rejects_inverted_range() {
        let ok = r#"{"start":"2026-03-02T09:00:00Z","end":"2026-03-02T10:00:00Z"}"#;
        let bad = r#"{"start":"2026-03-02T10:00:00Z","end":"2026-03-02T09:00:00Z"}"#;

        let range: TimeRange = serde_json::from_str(ok).unwrap();
        assert_eq!(range.duration(), TimeDelta::hours(1));
        assert!(serde_json::from_str::<TimeRange>(bad).is_err());
    }
}
