use std::sync::Arc;

use anyhow::Result;
use api::{AppState, PgAppointmentStore};
use agenda_shared::bootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    let _guard = bootstrap::init_tracing("api");

    tracing::info!("Starting Agenda API server");

    // Load configuration
    let config = api::config::Config::from_env()?;
    tracing::info!(
        "Server configuration loaded: {}:{} (timezone {})",
        config.host,
        config.port,
        config.calendar.timezone
    );

    let pool = bootstrap::init_db(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations completed");

    let state = AppState::new(Arc::new(PgAppointmentStore::new(pool)), config.calendar.clone());

    // Start server using library function
    api::run_api(state, &config).await?;

    Ok(())
}
