//! Appointment repository for database operations

use agenda_core::{
    Appointment, AppointmentId, AppointmentPatch, AppointmentStore, NewAppointment, SeriesId, SeriesIncomplete,
    StoreError, TimeRange,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const COLUMNS: &str = "id, title, location, color, status, start_at, end_at, series_id";

const INSERT: &str = "INSERT INTO appointments (title, location, color, status, start_at, end_at, series_id) \
     VALUES ($1, $2, $3, $4, $5, $6, $7) \
     RETURNING id, title, location, color, status, start_at, end_at, series_id";

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    title: String,
    location: Option<String>,
    color: Option<String>,
    status: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    series_id: Option<Uuid>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = StoreError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: AppointmentId::from(row.id),
            time_range: TimeRange::new(row.start_at, row.end_at)?,
            title: row.title,
            location: row.location,
            color: row.color,
            status: row.status,
            series_id: row.series_id.map(SeriesId::from),
        })
    }
}

/// Map sqlx errors onto the store's failure kinds
fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && let Some(constraint) = db_err.constraint()
    {
        return StoreError::Rejected(format!("Constraint violation: {}", constraint));
    }
    StoreError::Unavailable(format!("Database error: {}", err))
}

/// PostgreSQL-backed [`AppointmentStore`]
#[derive(Debug, Clone)]
pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_all(
        tx: &mut Transaction<'_, Postgres>,
        occurrences: Vec<NewAppointment>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let mut created = Vec::with_capacity(occurrences.len());
        for occurrence in &occurrences {
            let row = bind_new(sqlx::query_as::<_, AppointmentRow>(INSERT), occurrence)
                .fetch_one(&mut **tx)
                .await
                .map_err(store_error)?;
            created.push(Appointment::try_from(row)?);
        }
        Ok(created)
    }
}

fn bind_new<'q>(
    query: sqlx::query::QueryAs<'q, Postgres, AppointmentRow, sqlx::postgres::PgArguments>,
    appointment: &'q NewAppointment,
) -> sqlx::query::QueryAs<'q, Postgres, AppointmentRow, sqlx::postgres::PgArguments> {
    query
        .bind(&appointment.title)
        .bind(&appointment.location)
        .bind(&appointment.color)
        .bind(&appointment.status)
        .bind(appointment.time_range.start())
        .bind(appointment.time_range.end())
        .bind(appointment.series_id.map(|s| s.0))
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn list(&self, window: TimeRange) -> Result<Vec<Appointment>, StoreError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {COLUMNS} FROM appointments \
             WHERE start_at < $2 AND end_at > $1 \
             ORDER BY start_at, id"
        ))
        .bind(window.start())
        .bind(window.end())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(Appointment::try_from).collect()
    }

    async fn update(&self, id: AppointmentId, patch: AppointmentPatch) -> Result<Appointment, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let current = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {COLUMNS} FROM appointments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_error)?
        .ok_or(StoreError::NotFound(id))?;

        let current = Appointment::try_from(current)?;
        let range = patch.apply(&current.time_range)?;

        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "UPDATE appointments SET start_at = $2, end_at = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.0)
        .bind(range.start())
        .bind(range.end())
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        tracing::debug!(appointment_id = %id, range = %range, "Appointment time updated");
        Appointment::try_from(row)
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let row = bind_new(sqlx::query_as::<_, AppointmentRow>(INSERT), &appointment)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Appointment::try_from(row)
    }

    /// All occurrences are inserted in one transaction; a failure stores none
    async fn create_many(&self, occurrences: Vec<NewAppointment>) -> Result<Vec<Appointment>, SeriesIncomplete> {
        let requested = occurrences.len();
        let series_id = occurrences.first().and_then(|o| o.series_id);
        let incomplete = |source: StoreError| SeriesIncomplete {
            created: 0,
            requested,
            series_id,
            source,
        };

        let mut tx = self.pool.begin().await.map_err(|e| incomplete(store_error(e)))?;
        let created = Self::insert_all(&mut tx, occurrences).await.map_err(incomplete)?;
        tx.commit().await.map_err(|e| incomplete(store_error(e)))?;

        tracing::debug!(count = created.len(), "Appointment series inserted");
        Ok(created)
    }
}
