//! Appoint scheduling bootstrap
//!
//! Connects to the scheduling database, applies pending migrations and
//! checks that the domain services can be built on top of it.

use anyhow::Context;

use appoint_scheduling::{config::AppConfig, logging, repository::Repository, services::Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    logging::init(&config.logging);

    tracing::info!("Starting Appoint scheduling v{}", env!("CARGO_PKG_VERSION"));

    let repository = Repository::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    repository
        .migrate()
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let _services = Services::new(repository);

    tracing::info!("Scheduling services ready");

    Ok(())
}
