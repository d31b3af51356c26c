//! Agenda API Server Library

pub mod config;
pub mod db;
pub mod error;
mod routes;

use std::sync::Arc;

use agenda_core::{AppointmentStore, CalendarConfig};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use db::appointments::PgAppointmentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AppointmentStore>,
    pub calendar: CalendarConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn AppointmentStore>, calendar: CalendarConfig) -> Self {
        Self { store, calendar }
    }
}

fn cors_layer(cors_origin: &str) -> CorsLayer {
    if cors_origin == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    match cors_origin.parse::<axum::http::HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            // No origin is allowed until the configuration is fixed
            tracing::error!("Invalid CORS origin '{}': {}", cors_origin, e);
            CorsLayer::new()
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api", routes::appointments::routes())
        .layer(cors_layer(cors_origin))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let user_agent = request
                        .headers()
                        .get(axum::http::header::USER_AGENT)
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                        user_agent = %user_agent,
                    )
                })
                .on_request(|_request: &axum::http::Request<_>, _span: &tracing::Span| {
                    tracing::debug!("started processing request");
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %response.status(),
                            "finished processing request"
                        );
                    },
                ),
        )
        .with_state(state)
}

/// Run the API server
///
/// This function starts the HTTP server and blocks until it exits.
///
/// # Arguments
/// * `state` - Application state holding the appointment store
/// * `config` - Server configuration
pub async fn run_api(state: AppState, config: &config::Config) -> Result<(), std::io::Error> {
    let app = create_router(state, &config.cors_allowed_origin);
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
