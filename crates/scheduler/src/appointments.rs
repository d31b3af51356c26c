//! Locally held appointments
//!
//! The view's working copy of the store. Optimistic edits land here first and
//! are later confirmed, reverted, or replaced by a resynchronization.

use agenda_core::{Appointment, AppointmentId, TimeRange};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentSet {
    items: Vec<Appointment>,
}

impl AppointmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Appointment> {
        self.items.iter()
    }

    pub fn get(&self, id: AppointmentId) -> Option<&Appointment> {
        self.items.iter().find(|a| a.id == id)
    }

    /// Overwrite one appointment's time range, returning the previous range
    pub fn set_time_range(&mut self, id: AppointmentId, range: TimeRange) -> Option<TimeRange> {
        let appointment = self.items.iter_mut().find(|a| a.id == id)?;
        Some(std::mem::replace(&mut appointment.time_range, range))
    }

    /// Replace a record by id, or append it if it is new
    pub fn upsert(&mut self, appointment: Appointment) {
        match self.items.iter_mut().find(|a| a.id == appointment.id) {
            Some(existing) => *existing = appointment,
            None => self.items.push(appointment),
        }
    }

    /// Discard everything held and take the store's list as-is
    pub fn replace_all(&mut self, appointments: Vec<Appointment>) {
        self.items = appointments;
    }

    pub fn to_vec(&self) -> Vec<Appointment> {
        self.items.clone()
    }
}

impl From<Vec<Appointment>> for AppointmentSet {
    fn from(items: Vec<Appointment>) -> Self {
        Self { items }
    }
}
