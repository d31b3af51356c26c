//! Health check endpoint

use agenda_core::TimeRange;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{TimeDelta, Utc};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

/// Health check endpoint
///
/// Returns 200 OK if the server can reach its appointment store
async fn health_check(State(state): State<AppState>) -> Response {
    let now = Utc::now();
    let check_window = TimeRange::starting_at(now, TimeDelta::seconds(1));

    let store_status = match check_window {
        Ok(window) => match state.store.list(window).await {
            Ok(_) => "healthy",
            Err(e) => {
                tracing::error!("Store health check failed: {}", e);
                "unhealthy"
            }
        },
        Err(_) => "unhealthy",
    };

    let healthy = store_status == "healthy";
    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        store: store_status.to_string(),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response)).into_response()
}

/// Health check routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
