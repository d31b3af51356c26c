//! Edge resizing
//!
//! Moves one edge of an appointment by the vertical pointer travel. The
//! opposite edge never moves. The result keeps at least the minimum duration
//! and the moved edge is snapped to the rounding step; if snapping would
//! break the minimum, the minimum wins.

use agenda_core::time_range::round_to_step;
use agenda_core::{Appointment, CalendarConfig, TimeRange};
use chrono::{DateTime, TimeDelta, Utc};

use crate::appointments::AppointmentSet;
use crate::commit::TimeChange;
use crate::error::SchedulerError;
use crate::gesture::{GestureState, ResizeEdge, ResizeSession};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone)]
pub struct ResizeController {
    pixels_per_hour: f64,
    min_duration: TimeDelta,
    snap_step: TimeDelta,
}

impl ResizeController {
    pub fn new(pixels_per_hour: f64, min_duration: TimeDelta, snap_step: TimeDelta) -> Self {
        Self {
            pixels_per_hour,
            min_duration,
            snap_step,
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.pixels_per_hour, config.min_duration(), config.snap_step())
    }

    pub fn begin(
        &self,
        state: &mut GestureState,
        appointment: &Appointment,
        edge: ResizeEdge,
        pointer_origin_y: f64,
    ) -> Result<(), SchedulerError> {
        state.ensure_idle()?;

        tracing::debug!(appointment_id = %appointment.id, ?edge, "Resize started");
        *state = GestureState::Resizing(ResizeSession {
            appointment_id: appointment.id,
            edge,
            original: appointment.time_range,
            pointer_origin_y,
            pointer_current_y: pointer_origin_y,
        });
        Ok(())
    }

    /// Track the pointer and return the live (unsnapped) preview
    pub fn update(&self, state: &mut GestureState, pointer_current_y: f64) -> Result<TimeRange, SchedulerError> {
        let GestureState::Resizing(session) = state else {
            return Err(SchedulerError::NoActiveSession);
        };

        session.pointer_current_y = pointer_current_y;
        Ok(self.preview(session))
    }

    /// Range shown while dragging: floored at the minimum duration but not snapped
    pub fn preview(&self, session: &ResizeSession) -> TimeRange {
        self.constrained(session, false)
    }

    /// Finish the resize, applying the snapped range to `appointments`.
    ///
    /// Returns `Ok(None)` when the final range equals the original.
    pub fn commit(
        &self,
        state: &mut GestureState,
        appointments: &mut AppointmentSet,
    ) -> Result<Option<TimeChange>, SchedulerError> {
        if !matches!(state, GestureState::Resizing(_)) {
            return Err(SchedulerError::NoActiveSession);
        }
        let GestureState::Resizing(session) = state.take() else {
            return Err(SchedulerError::NoActiveSession);
        };

        let proposed = self.constrained(&session, true);
        if proposed == session.original {
            return Ok(None);
        }

        appointments
            .set_time_range(session.appointment_id, proposed)
            .ok_or(SchedulerError::AppointmentNotFound(session.appointment_id))?;

        tracing::info!(
            appointment_id = %session.appointment_id,
            edge = ?session.edge,
            from = %session.original,
            to = %proposed,
            "Appointment resized"
        );

        Ok(Some(TimeChange {
            appointment_id: session.appointment_id,
            previous: session.original,
            proposed,
        }))
    }

    pub fn cancel(&self, state: &mut GestureState) -> bool {
        if matches!(state, GestureState::Resizing(_)) {
            state.take();
            true
        } else {
            false
        }
    }

    /// Pixel travel converted to time at the grid scale; `None` when it is
    /// not finite or does not fit a `TimeDelta`
    fn travel_to_delta(&self, pixels: f64) -> Option<TimeDelta> {
        let millis = (pixels / self.pixels_per_hour * MILLIS_PER_HOUR).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return None;
        }
        TimeDelta::try_milliseconds(millis as i64)
    }

    /// Constrained range for the session; travel that leaves the representable
    /// time range keeps the original
    fn constrained(&self, session: &ResizeSession, snap: bool) -> TimeRange {
        let original = session.original;
        let Some(delta) = self.travel_to_delta(session.travel()) else {
            return original;
        };
        let moved = |edge: DateTime<Utc>| edge.checked_add_signed(delta);

        let (start, end) = match session.edge {
            ResizeEdge::Top => {
                let Some(moved_start) = moved(original.start()) else {
                    return original;
                };
                let latest = original.end() - self.min_duration;
                let mut start = moved_start.min(latest);
                if snap {
                    start = round_to_step(start, self.snap_step).min(latest);
                }
                (start, original.end())
            }
            ResizeEdge::Bottom => {
                let Some(moved_end) = moved(original.end()) else {
                    return original;
                };
                let earliest = original.start() + self.min_duration;
                let mut end = moved_end.max(earliest);
                if snap {
                    end = round_to_step(end, self.snap_step).max(earliest);
                }
                (original.start(), end)
            }
        };

        // Both arms keep at least `min_duration` between the edges
        TimeRange::new(start, end).unwrap_or(original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_core::{AppointmentId, NewAppointment};
    use chrono::{TimeZone, Utc};

    fn controller() -> ResizeController {
        ResizeController::from_config(&CalendarConfig::default())
    }

    fn appointment(start: (u32, u32), end: (u32, u32)) -> Appointment {
        NewAppointment::new(
            "Follow-up",
            TimeRange::new(
                Utc.with_ymd_and_hms(2026, 6, 10, start.0, start.1, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 6, 10, end.0, end.1, 0).unwrap(),
            )
            .unwrap(),
        )
        .into_appointment(AppointmentId::new())
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 10, hour, minute, 0).unwrap()
    }

    fn resize(
        appointment: &Appointment,
        edge: ResizeEdge,
        travel: f64,
    ) -> (Option<TimeChange>, AppointmentSet) {
        let c = controller();
        let mut set = AppointmentSet::from(vec![appointment.clone()]);
        let mut state = GestureState::Idle;
        c.begin(&mut state, appointment, edge, 100.0).unwrap();
        c.update(&mut state, 100.0 + travel).unwrap();
        let change = c.commit(&mut state, &mut set).unwrap();
        assert!(state.is_idle());
        (change, set)
    }

    #[test]
    fn test_bottom_edge_snaps_down() {
        let a = appointment((10, 0), (11, 0));
        let (change, set) = resize(&a, ResizeEdge::Bottom, 7.0);
        let change = change.unwrap();
        assert_eq!(change.proposed.start(), at(10, 0));
        assert_eq!(change.proposed.end(), at(11, 5));
        assert_eq!(set.get(a.id).unwrap().time_range, change.proposed);
    }

    #[test]
    fn test_bottom_edge_snaps_up() {
        let a = appointment((10, 0), (11, 0));
        let (change, _) = resize(&a, ResizeEdge::Bottom, 8.0);
        assert_eq!(change.unwrap().proposed.end(), at(11, 10));
    }

    #[test]
    fn test_top_edge_moves_start_only() {
        let a = appointment((10, 0), (11, 0));
        let (change, _) = resize(&a, ResizeEdge::Top, -22.0);
        let proposed = change.unwrap().proposed;
        assert_eq!(proposed.start(), at(9, 40));
        assert_eq!(proposed.end(), at(11, 0));
    }

    #[test]
    fn test_bottom_edge_clamps_to_minimum() {
        let a = appointment((10, 0), (11, 0));
        let (change, _) = resize(&a, ResizeEdge::Bottom, -45.0);
        let proposed = change.unwrap().proposed;
        assert_eq!(proposed.end(), at(10, 30));
        assert_eq!(proposed.duration(), TimeDelta::minutes(30));
    }

    #[test]
    fn test_bottom_edge_dragged_past_start() {
        let a = appointment((10, 0), (11, 0));
        let (change, _) = resize(&a, ResizeEdge::Bottom, -240.0);
        let proposed = change.unwrap().proposed;
        assert_eq!(proposed.start(), at(10, 0));
        assert_eq!(proposed.end(), at(10, 30));
    }

    #[test]
    fn test_top_edge_dragged_past_end() {
        let a = appointment((10, 0), (11, 0));
        let (change, _) = resize(&a, ResizeEdge::Top, 300.0);
        let proposed = change.unwrap().proposed;
        assert_eq!(proposed.start(), at(10, 30));
        assert_eq!(proposed.end(), at(11, 0));
    }

    #[test]
    fn test_minimum_wins_over_rounding() {
        // Starts off-grid so the floor itself is off-grid
        let a = appointment((10, 2), (11, 0));
        let (change, _) = resize(&a, ResizeEdge::Bottom, -29.0);
        let proposed = change.unwrap().proposed;
        assert_eq!(proposed.end(), at(10, 32));
        assert_eq!(proposed.duration(), TimeDelta::minutes(30));
    }

    #[test]
    fn test_short_appointment_grows_to_minimum() {
        let a = appointment((10, 0), (10, 15));
        let (change, _) = resize(&a, ResizeEdge::Bottom, 1.0);
        assert_eq!(change.unwrap().proposed.duration(), TimeDelta::minutes(30));
    }

    #[test]
    fn test_tiny_travel_is_a_no_op() {
        let a = appointment((10, 0), (11, 0));
        let (change, set) = resize(&a, ResizeEdge::Bottom, 2.0);
        assert_eq!(change, None);
        assert_eq!(set.get(a.id).unwrap().time_range, a.time_range);
    }

    #[test]
    fn test_preview_is_floored_but_not_snapped() {
        let c = controller();
        let a = appointment((10, 0), (11, 0));
        let mut state = GestureState::Idle;
        c.begin(&mut state, &a, ResizeEdge::Bottom, 0.0).unwrap();

        assert_eq!(c.update(&mut state, 7.0).unwrap().end(), at(11, 7));
        assert_eq!(c.update(&mut state, -50.0).unwrap().end(), at(10, 30));
    }

    #[test]
    fn test_scale_follows_pixels_per_hour() {
        let c = ResizeController::new(120.0, TimeDelta::minutes(30), TimeDelta::minutes(5));
        let a = appointment((10, 0), (11, 0));
        let mut set = AppointmentSet::from(vec![a.clone()]);
        let mut state = GestureState::Idle;
        c.begin(&mut state, &a, ResizeEdge::Bottom, 0.0).unwrap();
        c.update(&mut state, 60.0).unwrap();
        let change = c.commit(&mut state, &mut set).unwrap().unwrap();
        assert_eq!(change.proposed.end(), at(11, 30));
    }

    #[test]
    fn test_cancel_discards_session() {
        let c = controller();
        let a = appointment((10, 0), (11, 0));
        let set = AppointmentSet::from(vec![a.clone()]);
        let mut state = GestureState::Idle;
        c.begin(&mut state, &a, ResizeEdge::Top, 0.0).unwrap();
        c.update(&mut state, -90.0).unwrap();
        assert!(c.cancel(&mut state));
        assert!(state.is_idle());
        assert_eq!(set.get(a.id).unwrap().time_range, a.time_range);
    }

    #[test]
    fn test_unrepresentable_travel_keeps_original() {
        let a = appointment((10, 0), (11, 0));

        for travel in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, 1e300, 2e12, -2e12] {
            let (change, set) = resize(&a, ResizeEdge::Bottom, travel);
            assert_eq!(change, None, "travel {}", travel);
            assert_eq!(set.get(a.id).unwrap().time_range, a.time_range);

            let (change, _) = resize(&a, ResizeEdge::Top, travel);
            assert_eq!(change, None, "travel {}", travel);
        }
    }

    #[test]
    fn test_update_without_session() {
        let c = controller();
        let mut state = GestureState::Idle;
        assert_eq!(c.update(&mut state, 4.0), Err(SchedulerError::NoActiveSession));
    }
}
