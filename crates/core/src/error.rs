//! Error types for Agenda core domain logic

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::{AppointmentId, SeriesId};

/// Core calendar domain errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Local time {0} does not exist in the calendar timezone")]
    NonexistentLocalTime(NaiveDateTime),
}

/// Result type alias for calendar operations
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Failures reported by an appointment store.
///
/// Callers in the scheduling core treat every variant the same way; the split
/// only exists so transports can map them to meaningful status codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Appointment not found: {0}")]
    NotFound(AppointmentId),

    #[error("Store rejected the request: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<CalendarError> for StoreError {
    fn from(err: CalendarError) -> Self {
        StoreError::Rejected(err.to_string())
    }
}

/// A multi-occurrence create that stopped part way.
///
/// `created` occurrences of `requested` were stored before `source`; stores
/// that write a series atomically report zero.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Series creation stopped after {created} of {requested} occurrences: {source}")]
pub struct SeriesIncomplete {
    pub created: usize,
    pub requested: usize,
    pub series_id: Option<SeriesId>,
    #[source]
    pub source: StoreError,
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
