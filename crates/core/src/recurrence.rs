//! Recurrence rules and their expansion
//!
//! A [`RecurrenceRule`] describes how an appointment repeats. Expansion walks
//! the rule period by period (day, week, month or year, stepped by the
//! interval) in the calendar's local time and yields UTC start instants
//! lazily. Every expansion is finite: open-ended rules stop at a configurable
//! ceiling so the series can be materialized one record per occurrence.
//!
//! Rules also round-trip through the RFC 5545 RRULE value syntax
//! (`FREQ=WEEKLY;BYDAY=MO,WE;COUNT=4`), restricted to the parts modelled here.

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::error::{CalendarError, CalendarResult};
use crate::time_range::TimeRange;
use crate::timezone::localize;

/// Consecutive periods without a single occurrence after which expansion
/// gives up (e.g. 29 February every fourth year counted from an odd year).
const MAX_EMPTY_PERIODS: u32 = 1_000;

/// Repetition unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// When a series stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum Termination {
    /// Open ended, bounded only by the expansion ceiling
    #[default]
    Never,
    /// Last allowed local date, inclusive
    OnDate(NaiveDate),
    /// Total number of occurrences
    AfterCount(u32),
}

/// Declarative repetition of an appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecurrenceRule", into = "RawRecurrenceRule")]
pub struct RecurrenceRule {
    pattern: Pattern,
    interval: u32,
    days_of_week: Vec<Weekday>,
    day_of_month: Option<u32>,
    month_of_year: Option<u32>,
    termination: Termination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRecurrenceRule {
    pattern: Pattern,
    #[serde(default = "default_interval")]
    interval: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    days_of_week: Vec<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    month_of_year: Option<u32>,
    #[serde(default)]
    termination: Termination,
}

fn default_interval() -> u32 {
    1
}

impl TryFrom<RawRecurrenceRule> for RecurrenceRule {
    type Error = CalendarError;

    fn try_from(raw: RawRecurrenceRule) -> Result<Self, Self::Error> {
        RecurrenceRule::from_parts(
            raw.pattern,
            raw.interval,
            raw.days_of_week,
            raw.day_of_month,
            raw.month_of_year,
            raw.termination,
        )
    }
}

impl From<RecurrenceRule> for RawRecurrenceRule {
    fn from(rule: RecurrenceRule) -> Self {
        Self {
            pattern: rule.pattern,
            interval: rule.interval,
            days_of_week: rule.days_of_week,
            day_of_month: rule.day_of_month,
            month_of_year: rule.month_of_year,
            termination: rule.termination,
        }
    }
}

fn invalid(msg: impl Into<String>) -> CalendarError {
    CalendarError::InvalidRecurrence(msg.into())
}

/// Longest a month can be in any year (February counts its leap day)
fn max_days_in_month(month: u32) -> u32 {
    match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

impl RecurrenceRule {
    /// Every `interval` days
    pub fn daily(interval: u32) -> CalendarResult<Self> {
        Self::from_parts(Pattern::Daily, interval, Vec::new(), None, None, Termination::Never)
    }

    /// On the listed weekdays of every `interval`-th week
    pub fn weekly(interval: u32, days: impl IntoIterator<Item = Weekday>) -> CalendarResult<Self> {
        Self::from_parts(
            Pattern::Weekly,
            interval,
            days.into_iter().collect(),
            None,
            None,
            Termination::Never,
        )
    }

    /// On `day_of_month` (default: the series start's day) of every `interval`-th month
    pub fn monthly(interval: u32, day_of_month: Option<u32>) -> CalendarResult<Self> {
        Self::from_parts(Pattern::Monthly, interval, Vec::new(), day_of_month, None, Termination::Never)
    }

    /// On a fixed month and day (defaults: the series start's) of every `interval`-th year
    pub fn yearly(
        interval: u32,
        month_of_year: Option<u32>,
        day_of_month: Option<u32>,
    ) -> CalendarResult<Self> {
        Self::from_parts(
            Pattern::Yearly,
            interval,
            Vec::new(),
            day_of_month,
            month_of_year,
            Termination::Never,
        )
    }

    /// Replace the termination mode
    pub fn ending(mut self, termination: Termination) -> CalendarResult<Self> {
        self.termination = termination;
        self.validate()?;
        Ok(self)
    }

    /// Build and validate a rule from its raw parts
    pub fn from_parts(
        pattern: Pattern,
        interval: u32,
        mut days_of_week: Vec<Weekday>,
        day_of_month: Option<u32>,
        month_of_year: Option<u32>,
        termination: Termination,
    ) -> CalendarResult<Self> {
        days_of_week.sort_by_key(Weekday::num_days_from_monday);
        days_of_week.dedup();

        let rule = Self {
            pattern,
            interval,
            days_of_week,
            day_of_month,
            month_of_year,
            termination,
        };
        rule.validate()?;
        Ok(rule)
    }

    fn validate(&self) -> CalendarResult<()> {
        if self.interval == 0 {
            return Err(invalid("interval must be at least 1"));
        }

        match self.pattern {
            Pattern::Weekly if self.days_of_week.is_empty() => {
                return Err(invalid("weekly rules need at least one weekday"));
            }
            Pattern::Weekly => {}
            _ if !self.days_of_week.is_empty() => {
                return Err(invalid("weekdays are only supported for weekly rules"));
            }
            _ => {}
        }

        if let Some(day) = self.day_of_month {
            if !matches!(self.pattern, Pattern::Monthly | Pattern::Yearly) {
                return Err(invalid("day of month is only supported for monthly and yearly rules"));
            }
            if !(1..=31).contains(&day) {
                return Err(invalid(format!("day of month {day} is outside 1-31")));
            }
        }

        if let Some(month) = self.month_of_year {
            if self.pattern != Pattern::Yearly {
                return Err(invalid("month of year is only supported for yearly rules"));
            }
            if !(1..=12).contains(&month) {
                return Err(invalid(format!("month {month} is outside 1-12")));
            }
            if let Some(day) = self.day_of_month
                && day > max_days_in_month(month)
            {
                return Err(invalid(format!("day {day} never occurs in month {month}")));
            }
        }

        if self.termination == Termination::AfterCount(0) {
            return Err(invalid("occurrence count must be at least 1"));
        }

        Ok(())
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn days_of_week(&self) -> &[Weekday] {
        &self.days_of_week
    }

    pub fn day_of_month(&self) -> Option<u32> {
        self.day_of_month
    }

    pub fn month_of_year(&self) -> Option<u32> {
        self.month_of_year
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Lazily expand the rule into UTC start instants.
    ///
    /// `series_start` anchors the series and is interpreted as wall-clock time
    /// in `tz`; no occurrence precedes it. At most `ceiling` instants are
    /// produced, whatever the termination mode. The iterator is `Clone`, so a
    /// fresh copy restarts the expansion from the beginning.
    pub fn occurrences(&self, series_start: DateTime<Utc>, tz: Tz, ceiling: usize) -> Occurrences {
        Occurrences::new(self.clone(), series_start, tz, ceiling)
    }

    /// Expand the rule into ranges that keep the template's duration
    pub fn occurrence_ranges(
        &self,
        template: TimeRange,
        tz: Tz,
        ceiling: usize,
    ) -> impl Iterator<Item = TimeRange> + use<> {
        let duration = template.duration();
        self.occurrences(template.start(), tz, ceiling)
            .filter_map(move |start| TimeRange::starting_at(start, duration).ok())
    }
}

/// Lazy, finite expansion of a [`RecurrenceRule`]
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    tz: Tz,
    start: NaiveDateTime,
    day_of_month: u32,
    month_of_year: u32,
    limit: usize,
    period: i64,
    pending: VecDeque<NaiveDate>,
    produced: usize,
    empty_periods: u32,
    finished: bool,
}

impl Occurrences {
    fn new(rule: RecurrenceRule, series_start: DateTime<Utc>, tz: Tz, ceiling: usize) -> Self {
        let start = series_start.with_timezone(&tz).naive_local();
        let day_of_month = rule.day_of_month.unwrap_or_else(|| start.day());
        let month_of_year = rule.month_of_year.unwrap_or_else(|| start.month());

        let limit = match rule.termination {
            Termination::AfterCount(count) => ceiling.min(count as usize),
            _ => ceiling,
        };

        let mut finished = limit == 0;
        if rule.pattern == Pattern::Yearly && day_of_month > max_days_in_month(month_of_year) {
            tracing::warn!(
                "Yearly rule on {}/{} never occurs, producing no occurrences",
                month_of_year,
                day_of_month
            );
            finished = true;
        }

        Self {
            rule,
            tz,
            start,
            day_of_month,
            month_of_year,
            limit,
            period: 0,
            pending: VecDeque::new(),
            produced: 0,
            empty_periods: 0,
            finished,
        }
    }

    /// Number of instants produced so far
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// First day of period `k` and the candidate dates inside it, in order.
    /// `None` once the calendar overflows.
    fn period_dates(&self, k: i64) -> Option<(NaiveDate, Vec<NaiveDate>)> {
        let start_date = self.start.date();
        let step = k.checked_mul(i64::from(self.rule.interval))?;

        let (anchor, candidates) = match self.rule.pattern {
            Pattern::Daily => {
                let day = start_date.checked_add_signed(TimeDelta::try_days(step)?)?;
                (day, vec![day])
            }
            Pattern::Weekly => {
                let offset = i64::from(start_date.weekday().num_days_from_monday());
                let first_week = start_date.checked_sub_signed(TimeDelta::try_days(offset)?)?;
                let monday =
                    first_week.checked_add_signed(TimeDelta::try_days(step.checked_mul(7)?)?)?;
                let days = self
                    .rule
                    .days_of_week
                    .iter()
                    .filter_map(|weekday| {
                        monday.checked_add_signed(TimeDelta::days(i64::from(
                            weekday.num_days_from_monday(),
                        )))
                    })
                    .collect();
                (monday, days)
            }
            Pattern::Monthly => {
                let base = i64::from(start_date.year()) * 12 + i64::from(start_date.month0());
                let index = base.checked_add(step)?;
                let year = i32::try_from(index.div_euclid(12)).ok()?;
                let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let day = NaiveDate::from_ymd_opt(year, month, self.day_of_month);
                (first, day.into_iter().collect())
            }
            Pattern::Yearly => {
                let year = i32::try_from(i64::from(start_date.year()).checked_add(step)?).ok()?;
                let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
                let day = NaiveDate::from_ymd_opt(year, self.month_of_year, self.day_of_month);
                (first, day.into_iter().collect())
            }
        };

        let dates = candidates.into_iter().filter(|d| *d >= start_date).collect();
        Some((anchor, dates))
    }

    fn past_end(&self, date: NaiveDate) -> bool {
        matches!(self.rule.termination, Termination::OnDate(until) if date > until)
    }
}

impl Iterator for Occurrences {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished || self.produced >= self.limit {
                self.finished = true;
                return None;
            }

            if let Some(date) = self.pending.pop_front() {
                if self.past_end(date) {
                    self.finished = true;
                    return None;
                }

                let local = date.and_time(self.start.time());
                match localize(&self.tz, local) {
                    Ok(instant) => {
                        self.produced += 1;
                        return Some(instant);
                    }
                    Err(_) => {
                        tracing::debug!("Skipping occurrence at nonexistent local time {}", local);
                        continue;
                    }
                }
            }

            let Some((anchor, dates)) = self.period_dates(self.period) else {
                self.finished = true;
                return None;
            };
            self.period += 1;

            if dates.is_empty() {
                if self.past_end(anchor) {
                    self.finished = true;
                    return None;
                }
                self.empty_periods += 1;
                if self.empty_periods >= MAX_EMPTY_PERIODS {
                    tracing::warn!(
                        "Recurrence produced nothing for {} consecutive periods, stopping",
                        MAX_EMPTY_PERIODS
                    );
                    self.finished = true;
                    return None;
                }
            } else {
                self.empty_periods = 0;
                self.pending.extend(dates);
            }
        }
    }
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn parse_weekday_code(code: &str) -> CalendarResult<Weekday> {
    match code {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        other => Err(invalid(format!("unsupported BYDAY value: {other}"))),
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let freq = match self.pattern {
            Pattern::Daily => "DAILY",
            Pattern::Weekly => "WEEKLY",
            Pattern::Monthly => "MONTHLY",
            Pattern::Yearly => "YEARLY",
        };
        write!(f, "FREQ={};INTERVAL={}", freq, self.interval)?;

        if !self.days_of_week.is_empty() {
            let days: Vec<&str> = self.days_of_week.iter().copied().map(weekday_code).collect();
            write!(f, ";BYDAY={}", days.join(","))?;
        }
        if let Some(month) = self.month_of_year {
            write!(f, ";BYMONTH={month}")?;
        }
        if let Some(day) = self.day_of_month {
            write!(f, ";BYMONTHDAY={day}")?;
        }
        match self.termination {
            Termination::Never => Ok(()),
            Termination::OnDate(until) => write!(f, ";UNTIL={}", until.format("%Y%m%d")),
            Termination::AfterCount(count) => write!(f, ";COUNT={count}"),
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = CalendarError;

    /// Parse an RFC 5545 RRULE value, with or without the `RRULE:` prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim();
        let body = body
            .strip_prefix("RRULE:")
            .or_else(|| body.strip_prefix("rrule:"))
            .unwrap_or(body);

        let mut pattern = None;
        let mut interval = 1;
        let mut days = Vec::new();
        let mut day_of_month = None;
        let mut month_of_year = None;
        let mut termination = Termination::Never;

        for part in body.split(';').filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| invalid(format!("malformed RRULE part: {part}")))?;
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim().to_ascii_uppercase();
            let number = |v: &str| -> CalendarResult<u32> {
                v.parse()
                    .map_err(|_| invalid(format!("{key} must be a positive number, got {v}")))
            };

            match key.as_str() {
                "FREQ" => {
                    pattern = Some(match value.as_str() {
                        "DAILY" => Pattern::Daily,
                        "WEEKLY" => Pattern::Weekly,
                        "MONTHLY" => Pattern::Monthly,
                        "YEARLY" => Pattern::Yearly,
                        other => return Err(invalid(format!("unsupported FREQ: {other}"))),
                    });
                }
                "INTERVAL" => interval = number(&value)?,
                "BYDAY" => {
                    days = value
                        .split(',')
                        .map(parse_weekday_code)
                        .collect::<CalendarResult<Vec<_>>>()?;
                }
                "BYMONTHDAY" => day_of_month = Some(number(&value)?),
                "BYMONTH" => month_of_year = Some(number(&value)?),
                "COUNT" | "UNTIL" if termination != Termination::Never => {
                    return Err(invalid("COUNT and UNTIL are mutually exclusive"));
                }
                "COUNT" => termination = Termination::AfterCount(number(&value)?),
                "UNTIL" => {
                    let date_part = value.get(..8).unwrap_or(&value);
                    let until = NaiveDate::parse_from_str(date_part, "%Y%m%d")
                        .map_err(|_| invalid(format!("malformed UNTIL: {value}")))?;
                    termination = Termination::OnDate(until);
                }
                "WKST" if value == "MO" => {}
                other => return Err(invalid(format!("unsupported RRULE part: {other}"))),
            }
        }

        let pattern = pattern.ok_or_else(|| invalid("RRULE must contain FREQ parameter"))?;
        Self::from_parts(pattern, interval, days, day_of_month, month_of_year, termination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn dates(instants: &[DateTime<Utc>]) -> Vec<NaiveDate> {
        instants.iter().map(|i| i.date_naive()).collect()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekly_mon_wed_count_four() {
        // 2026-01-05 is a Monday
        let rule = RecurrenceRule::weekly(1, [Weekday::Mon, Weekday::Wed])
            .unwrap()
            .ending(Termination::AfterCount(4))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 1, 5, 9, 0), Tz::UTC, 730).collect();

        assert_eq!(
            result,
            vec![
                utc(2026, 1, 5, 9, 0),
                utc(2026, 1, 7, 9, 0),
                utc(2026, 1, 12, 9, 0),
                utc(2026, 1, 14, 9, 0),
            ]
        );
    }

    #[test]
    fn test_weekly_skips_days_before_start_in_first_week() {
        // Start on a Wednesday; Monday of that week is before the series
        let rule = RecurrenceRule::weekly(1, [Weekday::Fri, Weekday::Mon, Weekday::Wed])
            .unwrap()
            .ending(Termination::AfterCount(4))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 1, 7, 10, 0), Tz::UTC, 730).collect();

        assert_eq!(
            dates(&result),
            vec![ymd(2026, 1, 7), ymd(2026, 1, 9), ymd(2026, 1, 12), ymd(2026, 1, 14)]
        );
    }

    #[test]
    fn test_biweekly_interval() {
        let rule = RecurrenceRule::weekly(2, [Weekday::Tue])
            .unwrap()
            .ending(Termination::AfterCount(3))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 1, 6, 8, 0), Tz::UTC, 730).collect();
        assert_eq!(dates(&result), vec![ymd(2026, 1, 6), ymd(2026, 1, 20), ymd(2026, 2, 3)]);
    }

    #[test]
    fn test_daily_with_interval() {
        let rule = RecurrenceRule::daily(3)
            .unwrap()
            .ending(Termination::AfterCount(3))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 2, 27, 7, 30), Tz::UTC, 730).collect();
        assert_eq!(
            result,
            vec![utc(2026, 2, 27, 7, 30), utc(2026, 3, 2, 7, 30), utc(2026, 3, 5, 7, 30)]
        );
    }

    #[test]
    fn test_monthly_skips_short_months() {
        let rule = RecurrenceRule::monthly(1, Some(31))
            .unwrap()
            .ending(Termination::AfterCount(4))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 1, 31, 12, 0), Tz::UTC, 730).collect();
        assert_eq!(
            dates(&result),
            vec![ymd(2026, 1, 31), ymd(2026, 3, 31), ymd(2026, 5, 31), ymd(2026, 7, 31)]
        );
    }

    #[test]
    fn test_monthly_defaults_to_start_day_and_skips_earlier_day() {
        let rule = RecurrenceRule::monthly(2, None)
            .unwrap()
            .ending(Termination::AfterCount(3))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 11, 15, 9, 0), Tz::UTC, 730).collect();
        assert_eq!(dates(&result), vec![ymd(2026, 11, 15), ymd(2027, 1, 15), ymd(2027, 3, 15)]);

        // Day 10 in the start month precedes the series start and is skipped
        let rule = RecurrenceRule::monthly(1, Some(10))
            .unwrap()
            .ending(Termination::AfterCount(1))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 11, 15, 9, 0), Tz::UTC, 730).collect();
        assert_eq!(dates(&result), vec![ymd(2026, 12, 10)]);
    }

    #[test]
    fn test_yearly_leap_day() {
        let rule = RecurrenceRule::yearly(1, Some(2), Some(29))
            .unwrap()
            .ending(Termination::AfterCount(2))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2024, 2, 29, 9, 0), Tz::UTC, 730).collect();
        assert_eq!(dates(&result), vec![ymd(2024, 2, 29), ymd(2028, 2, 29)]);
    }

    #[test]
    fn test_yearly_never_matching_terminates() {
        // Every fourth year from 2025 never hits a leap year
        let rule = RecurrenceRule::yearly(4, Some(2), Some(29)).unwrap();
        let result: Vec<_> = rule.occurrences(utc(2025, 1, 1, 9, 0), Tz::UTC, 730).collect();
        assert!(result.is_empty());
    }

    #[test]
    fn test_on_date_is_inclusive() {
        let rule = RecurrenceRule::daily(1)
            .unwrap()
            .ending(Termination::OnDate(ymd(2026, 6, 3)))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 6, 1, 18, 0), Tz::UTC, 730).collect();
        assert_eq!(dates(&result), vec![ymd(2026, 6, 1), ymd(2026, 6, 2), ymd(2026, 6, 3)]);
    }

    #[test]
    fn test_on_date_before_start_is_empty() {
        let rule = RecurrenceRule::monthly(1, None)
            .unwrap()
            .ending(Termination::OnDate(ymd(2026, 1, 1)))
            .unwrap();
        assert_eq!(rule.occurrences(utc(2026, 6, 1, 18, 0), Tz::UTC, 730).count(), 0);
    }

    #[test]
    fn test_never_is_capped_by_ceiling() {
        let rule = RecurrenceRule::daily(1).unwrap();
        assert_eq!(rule.occurrences(utc(2026, 1, 1, 9, 0), Tz::UTC, 50).count(), 50);

        // The ceiling also caps explicit counts
        let counted = rule.ending(Termination::AfterCount(900)).unwrap();
        assert_eq!(counted.occurrences(utc(2026, 1, 1, 9, 0), Tz::UTC, 730).count(), 730);
    }

    #[test]
    fn test_keeps_local_time_across_dst() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // 09:00 EST = 14:00 UTC; after 2026-03-08 it is 09:00 EDT = 13:00 UTC
        let rule = RecurrenceRule::daily(1)
            .unwrap()
            .ending(Termination::AfterCount(3))
            .unwrap();
        let result: Vec<_> = rule.occurrences(utc(2026, 3, 7, 14, 0), tz, 730).collect();

        assert_eq!(result[0].hour(), 14);
        assert_eq!(result[1].hour(), 13);
        assert_eq!(result[2].hour(), 13);
    }

    #[test]
    fn test_skips_nonexistent_local_time() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // 02:30 local does not exist on 2026-03-08
        let start = localize(&tz, ymd(2026, 3, 7).and_hms_opt(2, 30, 0).unwrap()).unwrap();
        let rule = RecurrenceRule::daily(1)
            .unwrap()
            .ending(Termination::AfterCount(2))
            .unwrap();
        let result: Vec<_> = rule.occurrences(start, tz, 730).collect();

        let local: Vec<_> = result.iter().map(|i| i.with_timezone(&tz).date_naive()).collect();
        assert_eq!(local, vec![ymd(2026, 3, 7), ymd(2026, 3, 9)]);
    }

    #[test]
    fn test_occurrences_are_restartable() {
        let rule = RecurrenceRule::weekly(1, [Weekday::Thu]).unwrap();
        let mut first = rule.occurrences(utc(2026, 1, 1, 9, 0), Tz::UTC, 10);
        let restart = first.clone();

        let a = first.next();
        assert_eq!(first.produced(), 1);
        assert_eq!(restart.take(1).next(), a);
    }

    #[test]
    fn test_occurrence_ranges_copy_duration() {
        let template =
            TimeRange::new(utc(2026, 1, 5, 9, 0), utc(2026, 1, 5, 9, 45)).unwrap();
        let rule = RecurrenceRule::daily(1)
            .unwrap()
            .ending(Termination::AfterCount(2))
            .unwrap();
        let ranges: Vec<_> = rule.occurrence_ranges(template, Tz::UTC, 730).collect();

        assert_eq!(ranges.len(), 2);
        assert!(ranges.iter().all(|r| r.duration() == TimeDelta::minutes(45)));
        assert_eq!(ranges[1].start(), utc(2026, 1, 6, 9, 0));
    }

    #[test]
    fn test_validation_errors() {
        assert!(RecurrenceRule::daily(0).is_err());
        assert!(RecurrenceRule::weekly(1, []).is_err());
        assert!(RecurrenceRule::monthly(1, Some(32)).is_err());
        assert!(RecurrenceRule::yearly(1, Some(13), Some(1)).is_err());
        assert!(RecurrenceRule::yearly(1, Some(2), Some(30)).is_err());
        assert!(
            RecurrenceRule::daily(1)
                .unwrap()
                .ending(Termination::AfterCount(0))
                .is_err()
        );
        assert!(
            RecurrenceRule::from_parts(
                Pattern::Daily,
                1,
                vec![Weekday::Mon],
                None,
                None,
                Termination::Never
            )
            .is_err()
        );
    }

    #[test]
    fn test_weekdays_are_sorted_and_deduplicated() {
        let rule = RecurrenceRule::weekly(1, [Weekday::Fri, Weekday::Mon, Weekday::Fri]).unwrap();
        assert_eq!(rule.days_of_week(), &[Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn test_rrule_text_round_trip() {
        let rule: RecurrenceRule = "RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE;COUNT=4"
            .parse()
            .unwrap();
        assert_eq!(rule.pattern(), Pattern::Weekly);
        assert_eq!(rule.interval(), 2);
        assert_eq!(rule.termination(), Termination::AfterCount(4));
        assert_eq!(rule.to_string(), "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE;COUNT=4");

        let until: RecurrenceRule = "FREQ=MONTHLY;BYMONTHDAY=15;UNTIL=20261231T235959Z"
            .parse()
            .unwrap();
        assert_eq!(until.termination(), Termination::OnDate(ymd(2026, 12, 31)));
        assert_eq!(until.day_of_month(), Some(15));
    }

    #[test]
    fn test_rrule_text_rejections() {
        assert!("COUNT=5".parse::<RecurrenceRule>().is_err());
        assert!("FREQ=HOURLY".parse::<RecurrenceRule>().is_err());
        assert!("FREQ=DAILY;COUNT=2;UNTIL=20260101".parse::<RecurrenceRule>().is_err());
        assert!("FREQ=WEEKLY;BYDAY=1MO".parse::<RecurrenceRule>().is_err());
        assert!("FREQ=DAILY;BYSETPOS=3".parse::<RecurrenceRule>().is_err());
    }

    #[test]
    fn test_serde_representation() {
        let json = r#"{
            "pattern": "weekly",
            "days_of_week": ["Mon", "Wed"],
            "termination": {"mode": "after_count", "value": 4}
        }"#;
        let rule: RecurrenceRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.interval(), 1);
        assert_eq!(rule.termination(), Termination::AfterCount(4));

        let never = r#"{"pattern": "weekly", "days_of_week": []}"#;
        assert!(serde_json::from_str::<RecurrenceRule>(never).is_err());
    }
}
