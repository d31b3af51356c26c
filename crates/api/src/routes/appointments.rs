//! Appointment REST API endpoints

use agenda_core::{
    Appointment, AppointmentId, AppointmentPatch, NewAppointment, RecurrenceRule, TimeRange, materialize_series,
    parse_timezone,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// List appointments query parameters
#[derive(Debug, Deserialize)]
pub struct ListAppointmentsQuery {
    /// Window start (inclusive)
    pub start: DateTime<Utc>,
    /// Window end (exclusive)
    pub end: DateTime<Utc>,
}

/// Recurrence given either as RRULE text or as a structured rule
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecurrenceInput {
    Text(String),
    Rule(RecurrenceRule),
}

impl RecurrenceInput {
    fn into_rule(self) -> Result<RecurrenceRule, ApiError> {
        match self {
            RecurrenceInput::Text(text) => Ok(text.parse()?),
            RecurrenceInput::Rule(rule) => Ok(rule),
        }
    }
}

/// Create series request
#[derive(Debug, Deserialize)]
pub struct CreateSeriesRequest {
    /// First occurrence; its duration and fields are copied to every occurrence
    pub appointment: NewAppointment,
    #[serde(default)]
    pub recurrence: Option<RecurrenceInput>,
    /// IANA timezone the rule is expanded in (default: server calendar timezone)
    #[serde(default)]
    pub timezone: Option<String>,
}

/// List appointments intersecting a window
async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let window = TimeRange::new(query.start, query.end)?;
    let appointments = state.store.list(window).await?;
    Ok(Json(appointments))
}

/// Create a single appointment
async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<NewAppointment>,
) -> Result<Response, ApiError> {
    let appointment = state.store.create(req).await?;
    tracing::info!(appointment_id = %appointment.id, "Appointment created");
    Ok((StatusCode::CREATED, Json(appointment)).into_response())
}

/// Patch an appointment's start and/or end
async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AppointmentPatch>,
) -> Result<Json<Appointment>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest(
            "Patch must set start, end, or both".to_string(),
        ));
    }

    let appointment = state.store.update(AppointmentId::from(id), patch).await?;
    Ok(Json(appointment))
}

/// Create an appointment, expanded into one record per occurrence when a
/// recurrence is given
async fn create_series(
    State(state): State<AppState>,
    Json(req): Json<CreateSeriesRequest>,
) -> Result<Response, ApiError> {
    let tz = match req.timezone.as_deref() {
        Some(name) => parse_timezone(name)?,
        None => state.calendar.timezone,
    };

    let occurrences = match req.recurrence {
        Some(input) => {
            let rule = input.into_rule()?;
            materialize_series(&req.appointment, &rule, tz, state.calendar.recurrence_ceiling)
        }
        None => vec![req.appointment],
    };

    if occurrences.is_empty() {
        return Err(ApiError::BadRequest(
            "Recurrence rule produced no occurrences".to_string(),
        ));
    }

    let created = state.store.create_many(occurrences).await?;

    tracing::info!(count = created.len(), "Appointment series created");
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// Appointment routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route("/appointments/series", post(create_series))
        .route("/appointments/{id}", patch(update_appointment))
}
