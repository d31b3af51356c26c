//! Error handling for API endpoints

use agenda_core::{CalendarError, SeriesId, SeriesIncomplete, StoreError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Occurrences stored before a series create failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,
}

/// API error type that can be converted to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unavailable(String),
    /// A series create stopped part way; the body says how far it got
    SeriesIncomplete(SeriesIncomplete),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = ErrorResponse {
            error: String::new(),
            details: None,
            created: None,
            series_id: None,
        };

        let (status, error) = match self {
            ApiError::NotFound(msg) => {
                body.details = Some(msg);
                (StatusCode::NOT_FOUND, "Not Found")
            }
            ApiError::BadRequest(msg) => {
                body.details = Some(msg);
                (StatusCode::BAD_REQUEST, "Bad Request")
            }
            ApiError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
            }
            ApiError::SeriesIncomplete(err) => {
                tracing::error!(
                    created = err.created,
                    requested = err.requested,
                    "Series creation incomplete: {}",
                    err.source
                );
                body.details = Some(err.to_string());
                body.created = Some(err.created);
                body.series_id = err.series_id;
                match err.source {
                    StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
                    StoreError::Rejected(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
                    StoreError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable"),
                }
            }
        };
        body.error = error.to_string();

        (status, Json(body)).into_response()
    }
}

/// Convert CalendarError to ApiError
impl From<CalendarError> for ApiError {
    fn from(err: CalendarError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<SeriesIncomplete> for ApiError {
    fn from(err: SeriesIncomplete) -> Self {
        ApiError::SeriesIncomplete(err)
    }
}

/// Convert StoreError to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Appointment not found: {}", id)),
            StoreError::Rejected(msg) => ApiError::BadRequest(msg),
            StoreError::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}
