//! Recurring appointment creation

use agenda_core::{Appointment, AppointmentStore, NewAppointment, RecurrenceRule, materialize_series};
use chrono_tz::Tz;

use crate::error::SchedulerError;

/// Persist `template`, expanded by `rule` when one is given.
///
/// Every occurrence shares one series identifier and is written through
/// [`AppointmentStore::create_many`], which reports how many occurrences
/// were stored when it fails part way.
pub async fn create_series<S>(
    store: &S,
    template: NewAppointment,
    rule: Option<&RecurrenceRule>,
    tz: Tz,
    ceiling: usize,
) -> Result<Vec<Appointment>, SchedulerError>
where
    S: AppointmentStore + ?Sized,
{
    let Some(rule) = rule else {
        return Ok(vec![store.create(template).await?]);
    };

    let occurrences = materialize_series(&template, rule, tz, ceiling);
    if occurrences.is_empty() {
        return Err(SchedulerError::EmptySeries);
    }

    tracing::info!(rule = %rule, occurrences = occurrences.len(), "Creating recurring series");

    Ok(store.create_many(occurrences).await?)
}
