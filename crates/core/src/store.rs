//! Appointment store port
//!
//! The persistence boundary of the scheduling core. Implementations live in
//! the crates that own a transport (in-memory, HTTP, PostgreSQL).

use async_trait::async_trait;

use crate::error::{SeriesIncomplete, StoreError};
use crate::models::{Appointment, AppointmentPatch, NewAppointment};
use crate::time_range::TimeRange;
use crate::types::AppointmentId;

/// Trait for appointment persistence operations
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Fetch every appointment intersecting `window`, ordered by start
    async fn list(&self, window: TimeRange) -> Result<Vec<Appointment>, StoreError>;

    /// Apply a partial time update and return the stored record
    async fn update(
        &self,
        id: AppointmentId,
        patch: AppointmentPatch,
    ) -> Result<Appointment, StoreError>;

    /// Persist one appointment
    async fn create(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;

    /// Persist materialized occurrences in order.
    ///
    /// The default issues one [`create`](Self::create) per occurrence and
    /// stops at the first failure, reporting what was already written.
    async fn create_many(&self, occurrences: Vec<NewAppointment>) -> Result<Vec<Appointment>, SeriesIncomplete> {
        let requested = occurrences.len();
        let series_id = occurrences.first().and_then(|o| o.series_id);

        let mut created = Vec::with_capacity(requested);
        for occurrence in occurrences {
            match self.create(occurrence).await {
                Ok(appointment) => created.push(appointment),
                Err(source) => {
                    tracing::error!(created = created.len(), requested, "Series creation interrupted: {}", source);
                    return Err(SeriesIncomplete {
                        created: created.len(),
                        requested,
                        series_id,
                        source,
                    });
                }
            }
        }

        Ok(created)
    }
}
