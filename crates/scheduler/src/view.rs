//! Calendar view
//!
//! Owns the locally held appointments, the gesture slot and the commit
//! bookkeeping for a day or week grid. Rendering is left to the host: the
//! view hands out a render plan in grid pixels and percentages, and reports
//! clicks and failures over a notification channel.

use std::collections::HashMap;

use agenda_core::timezone::day_window;
use agenda_core::{
    Appointment, AppointmentId, AppointmentStore, CalendarConfig, StoreError, TimeRange, layout_columns,
};
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::appointments::AppointmentSet;
use crate::commit::{CommitQueue, CommitResolution, CommitStatus, PendingCommit};
use crate::drag::DragRelocationController;
use crate::error::SchedulerError;
use crate::gesture::{GestureState, HitZone, Point, ResizeEdge, TimeSlot};
use crate::resize::ResizeController;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    #[default]
    Week,
}

impl ViewMode {
    fn days(self) -> u64 {
        match self {
            ViewMode::Day => 1,
            ViewMode::Week => 7,
        }
    }
}

/// One positioned block of the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderItem {
    pub appointment: Appointment,
    /// Column of the visible day (0 = first visible day)
    pub day_index: usize,
    /// Pixels from the top of the visible hours
    pub top_offset: f64,
    pub height: f64,
    pub left_percent: f64,
    pub width_percent: f64,
}

/// Where to draw the current-time line
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NowIndicator {
    pub day_index: usize,
    pub top_offset: f64,
}

/// Events the host reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarNotification {
    AppointmentClicked(AppointmentId),
    TimeSlotClicked(TimeSlot),
    DateChanged(NaiveDate),
    /// An optimistic change was rolled back
    PersistenceFailed {
        appointment_id: AppointmentId,
        error: StoreError,
    },
    /// The authoritative list could not be fetched after a rollback
    ResyncFailed(StoreError),
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: u64,
    proposed: TimeRange,
}

pub struct CalendarView {
    config: CalendarConfig,
    mode: ViewMode,
    anchor: NaiveDate,
    appointments: AppointmentSet,
    gesture: GestureState,
    drag: DragRelocationController,
    resize: ResizeController,
    queue: CommitQueue,
    in_flight: HashMap<AppointmentId, InFlight>,
    next_ticket: u64,
    /// A rollback arrived for a period no longer shown
    stale: bool,
    notifier: Option<mpsc::UnboundedSender<CalendarNotification>>,
}

impl CalendarView {
    pub fn new(config: CalendarConfig, mode: ViewMode, anchor: NaiveDate) -> Self {
        Self {
            drag: DragRelocationController::new(config.timezone),
            resize: ResizeController::from_config(&config),
            config,
            mode,
            anchor,
            appointments: AppointmentSet::new(),
            gesture: GestureState::Idle,
            queue: CommitQueue::new(),
            in_flight: HashMap::new(),
            next_ticket: 1,
            stale: false,
            notifier: None,
        }
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn appointments(&self) -> &AppointmentSet {
        &self.appointments
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    /// Whether an optimistic change for `id` is still waiting on the store
    pub fn is_pending(&self, id: AppointmentId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Whether the local set must be reloaded with [`refresh`](Self::refresh)
    /// before it matches the store again
    pub fn needs_refresh(&self) -> bool {
        self.stale
    }

    /// Replace the local appointments with `appointments`
    pub fn load(&mut self, appointments: Vec<Appointment>) {
        self.appointments.replace_all(appointments);
        self.reapply_in_flight();
        self.stale = false;
    }

    /// Receive host notifications; a new subscription replaces the previous one
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<CalendarNotification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.notifier = Some(tx);
        rx
    }

    fn notify(&self, notification: CalendarNotification) {
        if let Some(tx) = &self.notifier
            && tx.send(notification).is_err()
        {
            tracing::debug!("Notification receiver dropped");
        }
    }

    // --- Grid geometry ---

    /// Days shown, first to last; weeks start on Monday
    pub fn visible_days(&self) -> Vec<NaiveDate> {
        self.first_day().iter_days().take(self.mode.days() as usize).collect()
    }

    fn first_day(&self) -> NaiveDate {
        match self.mode {
            ViewMode::Day => self.anchor,
            ViewMode::Week => {
                let offset = u64::from(self.anchor.weekday().num_days_from_monday());
                self.anchor - Days::new(offset)
            }
        }
    }

    /// Visible hours of one day as a UTC range
    pub fn day_window(&self, date: NaiveDate) -> Result<TimeRange, SchedulerError> {
        Ok(day_window(
            date,
            &self.config.timezone,
            self.config.day_start_hour,
            self.config.day_end_hour,
        )?)
    }

    /// From the first visible hour of the first day to the last of the last day
    pub fn visible_window(&self) -> Result<TimeRange, SchedulerError> {
        let first = self.first_day();
        let last = first + Days::new(self.mode.days() - 1);
        Ok(TimeRange::new(
            self.day_window(first)?.start(),
            self.day_window(last)?.end(),
        )?)
    }

    fn pixels(&self, span: TimeDelta) -> f64 {
        span.num_milliseconds() as f64 / MILLIS_PER_HOUR * self.config.pixels_per_hour
    }

    /// Range an appointment is drawn at, following a live gesture preview
    fn displayed_range(&self, appointment: &Appointment) -> TimeRange {
        match self.preview() {
            Some((id, range)) if id == appointment.id => range,
            _ => appointment.time_range,
        }
    }

    /// Position every appointment visible in the current period.
    ///
    /// Appointments are clipped to each day's visible hours; one spanning
    /// several days yields one item per day. Columns are computed per day.
    pub fn render_plan(&self) -> Result<Vec<RenderItem>, SchedulerError> {
        let mut plan = Vec::new();

        for (day_index, date) in self.visible_days().into_iter().enumerate() {
            let window = self.day_window(date)?;

            let (members, ranges): (Vec<&Appointment>, Vec<TimeRange>) = self
                .appointments
                .iter()
                .filter_map(|a| self.displayed_range(a).clip(&window).map(|clipped| (a, clipped)))
                .unzip();

            let slots = layout_columns(&ranges);

            for ((appointment, range), slot) in members.into_iter().zip(ranges).zip(slots) {
                plan.push(RenderItem {
                    appointment: appointment.clone(),
                    day_index,
                    top_offset: self.pixels(range.start() - window.start()),
                    height: self.pixels(range.duration()),
                    left_percent: slot.left_percent(),
                    width_percent: slot.width_percent(),
                });
            }
        }

        Ok(plan)
    }

    /// Current-time line, if `now` falls inside the visible hours
    pub fn now_indicator(&self, now: DateTime<Utc>) -> Option<NowIndicator> {
        self.visible_days()
            .into_iter()
            .enumerate()
            .find_map(|(day_index, date)| {
                let window = self.day_window(date).ok()?;
                window.contains(now).then(|| NowIndicator {
                    day_index,
                    top_offset: self.pixels(now - window.start()),
                })
            })
    }

    /// Hour cell under a vertical offset of a visible day
    pub fn slot_at(&self, day_index: usize, y: f64) -> Option<TimeSlot> {
        let date = *self.visible_days().get(day_index)?;
        if !y.is_finite() || y < 0.0 {
            return None;
        }
        // `as` saturates, so offsets past the grid fail the add or the bound
        let cells = (y / self.config.pixels_per_hour).floor() as u32;
        let hour = self.config.day_start_hour.checked_add(cells)?;
        (hour < self.config.day_end_hour).then(|| TimeSlot::new(date, hour))
    }

    // --- Host callbacks ---

    pub fn on_appointment_click(&self, id: AppointmentId) {
        self.notify(CalendarNotification::AppointmentClicked(id));
    }

    pub fn on_time_slot_click(&self, date: NaiveDate, hour: u32) {
        self.notify(CalendarNotification::TimeSlotClicked(TimeSlot::new(date, hour)));
    }

    pub fn on_date_change(&mut self, date: NaiveDate) {
        self.anchor = date;
        self.notify(CalendarNotification::DateChanged(date));
    }

    pub fn next_period(&mut self) {
        self.on_date_change(self.anchor + Days::new(self.mode.days()));
    }

    pub fn previous_period(&mut self) {
        self.on_date_change(self.anchor - Days::new(self.mode.days()));
    }

    // --- Gestures ---

    /// Route a pointer-down on an appointment to drag or resize
    pub fn pointer_down(&mut self, id: AppointmentId, zone: HitZone, point: Point) -> Result<(), SchedulerError> {
        let appointment = self
            .appointments
            .get(id)
            .ok_or(SchedulerError::AppointmentNotFound(id))?;

        match zone {
            HitZone::Body => self.drag.begin(&mut self.gesture, appointment, point),
            HitZone::TopHandle => self
                .resize
                .begin(&mut self.gesture, appointment, ResizeEdge::Top, point.y),
            HitZone::BottomHandle => self
                .resize
                .begin(&mut self.gesture, appointment, ResizeEdge::Bottom, point.y),
        }
    }

    pub fn drag_to(&mut self, point: Point, target: Option<TimeSlot>) -> Result<Option<TimeRange>, SchedulerError> {
        self.drag.update(&mut self.gesture, point, target)
    }

    pub fn resize_to(&mut self, y: f64) -> Result<TimeRange, SchedulerError> {
        self.resize.update(&mut self.gesture, y)
    }

    /// Live range of the appointment under the running gesture
    pub fn preview(&self) -> Option<(AppointmentId, TimeRange)> {
        match &self.gesture {
            GestureState::Idle => None,
            GestureState::Dragging(session) => self
                .drag
                .preview(session)
                .map(|range| (session.appointment_id, range)),
            GestureState::Resizing(session) => Some((session.appointment_id, self.resize.preview(session))),
        }
    }

    pub fn cancel_gesture(&mut self) -> bool {
        self.drag.cancel(&mut self.gesture) || self.resize.cancel(&mut self.gesture)
    }

    /// Finish the running gesture.
    ///
    /// The change is applied locally before this returns; the returned
    /// commit still has to be persisted and its resolution applied with
    /// [`apply_resolution`](Self::apply_resolution). `Ok(None)` means nothing
    /// changed and nothing needs persisting.
    pub fn release(&mut self) -> Result<Option<PendingCommit>, SchedulerError> {
        let window = self.visible_window()?;

        let change = if matches!(self.gesture, GestureState::Dragging(_)) {
            self.drag.commit(&mut self.gesture, &mut self.appointments)?
        } else if matches!(self.gesture, GestureState::Resizing(_)) {
            self.resize.commit(&mut self.gesture, &mut self.appointments)?
        } else {
            return Err(SchedulerError::NoActiveSession);
        };

        let Some(change) = change else {
            return Ok(None);
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight.insert(
            change.appointment_id,
            InFlight {
                ticket,
                proposed: change.proposed,
            },
        );

        let turn = self.queue.reserve(change.appointment_id);
        Ok(Some(PendingCommit::new(change, ticket, window, turn)))
    }

    /// Fold a persistence outcome back into the local state.
    ///
    /// A confirmation adopts the store's record unless a newer change to the
    /// same appointment is still in flight. A rejection restores the
    /// pre-gesture range, then replaces the whole local set with the store's
    /// list; changes still in flight are re-applied on top. When the list was
    /// fetched for a period the view has since left, it is discarded and
    /// [`needs_refresh`](Self::needs_refresh) turns true.
    pub fn apply_resolution(&mut self, resolution: CommitResolution) -> CommitStatus {
        match resolution {
            CommitResolution::Confirmed { ticket, appointment } => {
                if self.is_latest(appointment.id, ticket) {
                    self.in_flight.remove(&appointment.id);
                    // Absent when the view has moved to another period since release
                    if self.appointments.get(appointment.id).is_some() {
                        self.appointments.upsert(appointment);
                    }
                }
                CommitStatus::Confirmed
            }
            CommitResolution::Rejected {
                ticket,
                change,
                error,
                window,
                resync,
            } => {
                let id = change.appointment_id;
                if self.is_latest(id, ticket) {
                    self.in_flight.remove(&id);
                    self.appointments.set_time_range(id, change.previous);
                }

                tracing::warn!(appointment_id = %id, "Rolled back time change: {}", error);
                self.notify(CalendarNotification::PersistenceFailed {
                    appointment_id: id,
                    error,
                });

                let current = self.visible_window().ok();
                match resync {
                    Ok(appointments) if current == Some(window) => self.load(appointments),
                    Ok(_) => {
                        tracing::debug!(appointment_id = %id, "Discarding resync for a period no longer visible");
                        self.stale = true;
                    }
                    Err(e) => {
                        self.stale = true;
                        self.notify(CalendarNotification::ResyncFailed(e));
                    }
                }
                CommitStatus::RolledBack
            }
        }
    }

    /// Release, persist and apply in one step
    pub async fn release_and_persist<S>(&mut self, store: &S) -> Result<Option<CommitStatus>, SchedulerError>
    where
        S: AppointmentStore + ?Sized,
    {
        let Some(pending) = self.release()? else {
            return Ok(None);
        };
        let resolution = pending.persist(store).await;
        let status = self.apply_resolution(resolution);

        if self.stale
            && let Err(e) = self.refresh(store).await
        {
            tracing::warn!("Refresh after rollback failed: {}", e);
        }
        Ok(Some(status))
    }

    /// Reload the visible window from `store`
    pub async fn refresh<S>(&mut self, store: &S) -> Result<usize, SchedulerError>
    where
        S: AppointmentStore + ?Sized,
    {
        let appointments = store.list(self.visible_window()?).await?;
        let count = appointments.len();
        self.load(appointments);
        tracing::debug!(count, "Calendar view refreshed");
        Ok(count)
    }

    fn is_latest(&self, id: AppointmentId, ticket: u64) -> bool {
        self.in_flight.get(&id).is_some_and(|f| f.ticket == ticket)
    }

    fn reapply_in_flight(&mut self) {
        for (id, in_flight) in &self.in_flight {
            self.appointments.set_time_range(*id, in_flight.proposed);
        }
    }
}
