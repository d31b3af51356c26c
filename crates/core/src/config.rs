//! Shared calendar configuration
//!
//! Handles loading of the calendar grid and recurrence settings from
//! environment variables.

use chrono::TimeDelta;
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::timezone::parse_timezone;

/// Hard ceiling on materialized occurrences for open-ended recurrence rules
pub const DEFAULT_RECURRENCE_CEILING: usize = 730;

/// Calendar settings shared by the scheduler and the API
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarConfig {
    /// Timezone of the visible grid (default: UTC)
    pub timezone: Tz,

    /// Vertical scale of the time grid (default: 60)
    pub pixels_per_hour: f64,

    /// First visible local hour (default: 0)
    pub day_start_hour: u32,

    /// Last visible local hour, exclusive (default: 24)
    pub day_end_hour: u32,

    /// Shortest duration a resize may produce, in minutes (default: 30)
    pub min_duration_minutes: i64,

    /// Resize rounding granularity, in minutes (default: 5)
    pub snap_minutes: i64,

    /// Occurrence cap for recurrence expansion (default: 730)
    pub recurrence_ceiling: usize,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            pixels_per_hour: 60.0,
            day_start_hour: 0,
            day_end_hour: 24,
            min_duration_minutes: 30,
            snap_minutes: 5,
            recurrence_ceiling: DEFAULT_RECURRENCE_CEILING,
        }
    }
}

impl CalendarConfig {
    /// Load configuration from environment variables
    ///
    /// This will also initialize dotenv if it hasn't been done yet.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timezone = match lookup("CALENDAR_TIMEZONE") {
            Some(name) => parse_timezone(&name).map_err(|_| ConfigError::InvalidValue {
                key: "CALENDAR_TIMEZONE".to_string(),
                value: name,
            })?,
            None => defaults.timezone,
        };

        let config = Self {
            timezone,
            pixels_per_hour: parse_or(&lookup, "CALENDAR_PIXELS_PER_HOUR", defaults.pixels_per_hour)?,
            day_start_hour: parse_or(&lookup, "CALENDAR_DAY_START_HOUR", defaults.day_start_hour)?,
            day_end_hour: parse_or(&lookup, "CALENDAR_DAY_END_HOUR", defaults.day_end_hour)?,
            min_duration_minutes: parse_or(
                &lookup,
                "CALENDAR_MIN_DURATION_MINUTES",
                defaults.min_duration_minutes,
            )?,
            snap_minutes: parse_or(&lookup, "CALENDAR_SNAP_MINUTES", defaults.snap_minutes)?,
            recurrence_ceiling: parse_or(
                &lookup,
                "RECURRENCE_MAX_OCCURRENCES",
                defaults.recurrence_ceiling,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, value: String| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        };

        if !(self.pixels_per_hour.is_finite() && self.pixels_per_hour > 0.0) {
            return Err(invalid("CALENDAR_PIXELS_PER_HOUR", self.pixels_per_hour.to_string()));
        }
        if self.day_end_hour > 24 || self.day_start_hour >= self.day_end_hour {
            return Err(invalid(
                "CALENDAR_DAY_END_HOUR",
                format!("{}..{}", self.day_start_hour, self.day_end_hour),
            ));
        }
        if self.min_duration_minutes <= 0 {
            return Err(invalid(
                "CALENDAR_MIN_DURATION_MINUTES",
                self.min_duration_minutes.to_string(),
            ));
        }
        if self.snap_minutes <= 0 {
            return Err(invalid("CALENDAR_SNAP_MINUTES", self.snap_minutes.to_string()));
        }
        if self.recurrence_ceiling == 0 {
            return Err(invalid("RECURRENCE_MAX_OCCURRENCES", "0".to_string()));
        }
        Ok(())
    }

    pub fn min_duration(&self) -> TimeDelta {
        TimeDelta::minutes(self.min_duration_minutes)
    }

    pub fn snap_step(&self) -> TimeDelta {
        TimeDelta::minutes(self.snap_minutes)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
