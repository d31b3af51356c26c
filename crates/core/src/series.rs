//! Series materialization
//!
//! Turns a template appointment plus a recurrence rule into one creation
//! payload per occurrence, all linked by a fresh [`SeriesId`].

use chrono_tz::Tz;

use crate::models::NewAppointment;
use crate::recurrence::RecurrenceRule;
use crate::types::SeriesId;

/// Expand `template` into one appointment per occurrence of `rule`.
///
/// Each occurrence keeps the template's duration and descriptive fields and
/// carries the same newly generated series identifier.
pub fn materialize_series(
    template: &NewAppointment,
    rule: &RecurrenceRule,
    tz: Tz,
    ceiling: usize,
) -> Vec<NewAppointment> {
    let series_id = SeriesId::new();

    rule.occurrence_ranges(template.time_range, tz, ceiling)
        .map(|time_range| NewAppointment {
            time_range,
            series_id: Some(series_id),
            ..template.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::Termination;
    use crate::time_range::TimeRange;
    use chrono::{TimeDelta, TimeZone, Utc, Weekday};

    #[test]
    fn test_materialize_shares_series_and_duration() {
        let template = NewAppointment {
            location: Some("Room 4".to_string()),
            ..NewAppointment::new(
                "Pipeline review",
                TimeRange::new(
                    Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
                    Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap(),
                )
                .unwrap(),
            )
        };
        let rule = RecurrenceRule::weekly(1, [Weekday::Mon, Weekday::Wed])
            .unwrap()
            .ending(Termination::AfterCount(4))
            .unwrap();

        let occurrences = materialize_series(&template, &rule, Tz::UTC, 730);

        assert_eq!(occurrences.len(), 4);
        let series = occurrences[0].series_id;
        assert!(series.is_some());
        for occurrence in &occurrences {
            assert_eq!(occurrence.series_id, series);
            assert_eq!(occurrence.time_range.duration(), TimeDelta::minutes(30));
            assert_eq!(occurrence.title, "Pipeline review");
            assert_eq!(occurrence.location.as_deref(), Some("Room 4"));
        }
    }

    #[test]
    fn test_each_materialization_gets_a_new_series() {
        let template = NewAppointment::new(
            "Standup",
            TimeRange::new(
                Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 1, 5, 9, 15, 0).unwrap(),
            )
            .unwrap(),
        );
        let rule = RecurrenceRule::daily(1)
            .unwrap()
            .ending(Termination::AfterCount(1))
            .unwrap();

        let a = materialize_series(&template, &rule, Tz::UTC, 730);
        let b = materialize_series(&template, &rule, Tz::UTC, 730);
        assert_ne!(a[0].series_id, b[0].series_id);
    }
}
