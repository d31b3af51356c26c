//! Core domain models for Agenda
//!
//! Title, location, color and status are carried verbatim; the scheduling
//! core only interprets the time range and the series link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CalendarResult;
use crate::time_range::TimeRange;
use crate::types::{AppointmentId, SeriesId};

/// Default status assigned when a client does not send one
pub const DEFAULT_STATUS: &str = "scheduled";

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// Appointment entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub time_range: TimeRange,
    pub title: String,
    pub location: Option<String>,
    pub color: Option<String>, // Hex color for UI
    #[serde(default = "default_status")]
    pub status: String,
    pub series_id: Option<SeriesId>, // Shared by every occurrence of one rule
}

impl Appointment {
    pub fn start(&self) -> DateTime<Utc> {
        self.time_range.start()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.time_range.end()
    }
}

/// Appointment payload before the store assigns an identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub time_range: TimeRange,
    pub title: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub series_id: Option<SeriesId>,
}

impl NewAppointment {
    /// A bare appointment with the default status
    pub fn new(title: impl Into<String>, time_range: TimeRange) -> Self {
        Self {
            time_range,
            title: title.into(),
            location: None,
            color: None,
            status: default_status(),
            series_id: None,
        }
    }

    /// Attach the identifier chosen by the store
    pub fn into_appointment(self, id: AppointmentId) -> Appointment {
        Appointment {
            id,
            time_range: self.time_range,
            title: self.title,
            location: self.location,
            color: self.color,
            status: self.status,
            series_id: self.series_id,
        }
    }
}

/// Partial update of an appointment's time range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl AppointmentPatch {
    /// Patch replacing both ends of the range
    pub fn from_range(range: TimeRange) -> Self {
        Self {
            start: Some(range.start()),
            end: Some(range.end()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Merge the patch into `current`, re-validating the result
    pub fn apply(&self, current: &TimeRange) -> CalendarResult<TimeRange> {
        TimeRange::new(
            self.start.unwrap_or(current.start()),
            self.end.unwrap_or(current.end()),
        )
    }
}
