//! Drag relocation
//!
//! Moves an appointment to a new start while keeping its duration. The drop
//! target is an hour cell of the grid; the pointer position is tracked only
//! so the host can render the dragged block under the cursor.

use agenda_core::{Appointment, TimeRange};
use chrono_tz::Tz;

use crate::appointments::AppointmentSet;
use crate::commit::TimeChange;
use crate::error::SchedulerError;
use crate::gesture::{DragSession, GestureState, Point, TimeSlot};

#[derive(Debug, Clone)]
pub struct DragRelocationController {
    tz: Tz,
}

impl DragRelocationController {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Start dragging `appointment`; its current range becomes the baseline
    pub fn begin(
        &self,
        state: &mut GestureState,
        appointment: &Appointment,
        pointer_origin: Point,
    ) -> Result<(), SchedulerError> {
        state.ensure_idle()?;

        tracing::debug!(appointment_id = %appointment.id, "Drag started");
        *state = GestureState::Dragging(DragSession {
            appointment_id: appointment.id,
            original: appointment.time_range,
            pointer_origin,
            pointer_current: pointer_origin,
            drop_target: None,
        });
        Ok(())
    }

    /// Track the pointer and the cell under it, returning the range the
    /// appointment would take if released now.
    pub fn update(
        &self,
        state: &mut GestureState,
        pointer_current: Point,
        drop_target: Option<TimeSlot>,
    ) -> Result<Option<TimeRange>, SchedulerError> {
        let GestureState::Dragging(session) = state else {
            return Err(SchedulerError::NoActiveSession);
        };

        session.pointer_current = pointer_current;
        session.drop_target = drop_target;
        Ok(self.preview(session))
    }

    /// Range for the current drop target, if it resolves to a valid start
    pub fn preview(&self, session: &DragSession) -> Option<TimeRange> {
        let target = session.drop_target?;
        self.relocated(session, target).ok()
    }

    /// Finish the drag.
    ///
    /// Without a drop target this behaves as [`cancel`](Self::cancel). A
    /// drop on the hour cell holding the original start keeps the
    /// appointment where it is, even when it starts off the hour; nothing is
    /// applied and `Ok(None)` is returned. Otherwise the new range is applied to `appointments` and
    /// the change is returned for persistence.
    pub fn commit(
        &self,
        state: &mut GestureState,
        appointments: &mut AppointmentSet,
    ) -> Result<Option<TimeChange>, SchedulerError> {
        if !matches!(state, GestureState::Dragging(_)) {
            return Err(SchedulerError::NoActiveSession);
        }
        let GestureState::Dragging(session) = state.take() else {
            return Err(SchedulerError::NoActiveSession);
        };

        let Some(target) = session.drop_target else {
            tracing::debug!(appointment_id = %session.appointment_id, "Drag released outside the grid");
            return Ok(None);
        };

        let proposed = self.relocated(&session, target)?;
        if proposed == session.original {
            return Ok(None);
        }

        appointments
            .set_time_range(session.appointment_id, proposed)
            .ok_or(SchedulerError::AppointmentNotFound(session.appointment_id))?;

        tracing::info!(
            appointment_id = %session.appointment_id,
            from = %session.original,
            to = %proposed,
            "Appointment relocated"
        );

        Ok(Some(TimeChange {
            appointment_id: session.appointment_id,
            previous: session.original,
            proposed,
        }))
    }

    /// Abandon the drag. Nothing was applied, so nothing is restored.
    pub fn cancel(&self, state: &mut GestureState) -> bool {
        if matches!(state, GestureState::Dragging(_)) {
            state.take();
            true
        } else {
            false
        }
    }

    fn relocated(&self, session: &DragSession, target: TimeSlot) -> Result<TimeRange, SchedulerError> {
        if target == TimeSlot::containing(session.original.start(), &self.tz) {
            return Ok(session.original);
        }
        let start = target.start_in(&self.tz)?;
        Ok(session.original.moved_to(start)?)
    }
}
