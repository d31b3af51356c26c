//! Gesture session state
//!
//! A calendar view runs at most one pointer gesture at a time. The state is a
//! single enum so "dragging and resizing at once" cannot be represented.

use agenda_core::{AppointmentId, TimeRange, localize};
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Pointer position in view pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An hour cell of the grid, expressed in the view's timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub hour: u32,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, hour: u32) -> Self {
        Self { date, hour }
    }

    /// The cell `instant` falls in when shown in `tz`
    pub fn containing(instant: DateTime<Utc>, tz: &Tz) -> Self {
        let local = instant.with_timezone(tz);
        Self::new(local.date_naive(), local.hour())
    }

    /// UTC instant at which this slot begins in `tz`
    pub fn start_in(&self, tz: &Tz) -> Result<DateTime<Utc>, SchedulerError> {
        let time = NaiveTime::from_hms_opt(self.hour, 0, 0)
            .ok_or_else(|| SchedulerError::InvalidDropTarget(format!("hour {} out of range", self.hour)))?;
        Ok(localize(tz, self.date.and_time(time))?)
    }
}

/// Which edge of an appointment a resize moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeEdge {
    Top,
    Bottom,
}

/// Part of a rendered appointment that received the pointer-down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitZone {
    Body,
    TopHandle,
    BottomHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub appointment_id: AppointmentId,
    /// Baseline captured at begin; commits and rollbacks restore this
    pub original: TimeRange,
    pub pointer_origin: Point,
    pub pointer_current: Point,
    pub drop_target: Option<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub appointment_id: AppointmentId,
    pub edge: ResizeEdge,
    pub original: TimeRange,
    pub pointer_origin_y: f64,
    pub pointer_current_y: f64,
}

impl ResizeSession {
    /// Vertical pointer travel since begin, in pixels
    pub fn travel(&self) -> f64 {
        self.pointer_current_y - self.pointer_origin_y
    }
}

/// The view's single gesture slot
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    /// Appointment targeted by the running gesture
    pub fn active_appointment(&self) -> Option<AppointmentId> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging(session) => Some(session.appointment_id),
            GestureState::Resizing(session) => Some(session.appointment_id),
        }
    }

    /// Fails with `SessionActive` unless the slot is free
    pub(crate) fn ensure_idle(&self) -> Result<(), SchedulerError> {
        match self.active_appointment() {
            Some(id) => Err(SchedulerError::SessionActive(id)),
            None => Ok(()),
        }
    }

    /// Reset to idle and hand back what was running
    pub(crate) fn take(&mut self) -> GestureState {
        std::mem::take(self)
    }
}
