//! In-memory appointment store
//!
//! Backs tests and single-process hosts. Cloning shares the same data.

use std::collections::HashMap;
use std::sync::Arc;

use agenda_core::{
    Appointment, AppointmentId, AppointmentPatch, AppointmentStore, NewAppointment, StoreError, TimeRange,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct InMemoryAppointmentStore {
    appointments: Arc<RwLock<HashMap<AppointmentId, Appointment>>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appointments(appointments: impl IntoIterator<Item = Appointment>) -> Self {
        let map = appointments.into_iter().map(|a| (a.id, a)).collect();
        Self {
            appointments: Arc::new(RwLock::new(map)),
        }
    }

    /// Every stored appointment, ordered by start
    pub async fn snapshot(&self) -> Vec<Appointment> {
        let guard = self.appointments.read().await;
        sorted(guard.values().cloned().collect())
    }

    pub async fn get(&self, id: AppointmentId) -> Option<Appointment> {
        self.appointments.read().await.get(&id).cloned()
    }
}

fn sorted(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by_key(|a| (a.start(), a.id));
    appointments
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn list(&self, window: TimeRange) -> Result<Vec<Appointment>, StoreError> {
        let guard = self.appointments.read().await;
        Ok(sorted(
            guard
                .values()
                .filter(|a| a.time_range.intersects(&window))
                .cloned()
                .collect(),
        ))
    }

    async fn update(&self, id: AppointmentId, patch: AppointmentPatch) -> Result<Appointment, StoreError> {
        let mut guard = self.appointments.write().await;
        let appointment = guard.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        appointment.time_range = patch.apply(&appointment.time_range)?;
        Ok(appointment.clone())
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let appointment = appointment.into_appointment(AppointmentId::new());
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }
}
