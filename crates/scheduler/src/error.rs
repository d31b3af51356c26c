//! Error types for the scheduling layer

use agenda_core::{AppointmentId, CalendarError, SeriesIncomplete, StoreError};
use thiserror::Error;

/// Errors raised by gesture controllers, the view and series creation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Another gesture is already in progress for appointment {0}")]
    SessionActive(AppointmentId),

    #[error("No gesture is in progress")]
    NoActiveSession,

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(AppointmentId),

    #[error("Invalid drop target: {0}")]
    InvalidDropTarget(String),

    #[error("Recurrence rule produced no occurrences")]
    EmptySeries,

    #[error(transparent)]
    SeriesIncomplete(#[from] SeriesIncomplete),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
