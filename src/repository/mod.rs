//! Repository layer for database operations

pub mod memory;
pub mod services;
pub mod store;
pub mod timetables;

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    Pool, Postgres,
};

use crate::{config::DatabaseConfig, error::AppResult};

pub use memory::MemoryStore;
pub use store::{ServiceStore, TimetableStore};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub services: services::ServicesRepository,
    pub timetables: timetables::TimetablesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            services: services::ServicesRepository::new(pool.clone()),
            timetables: timetables::TimetablesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open a connection pool as described by the configuration
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_with(connect_options(config)?)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }
}

/// Connection options from either `url` or the discrete connection fields
pub fn connect_options(config: &DatabaseConfig) -> AppResult<PgConnectOptions> {
    if let Some(url) = config.url.as_deref().filter(|u| !u.is_empty()) {
        return Ok(url.parse::<PgConnectOptions>()?);
    }

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.name)
        .ssl_mode(if config.ssl_mode {
            PgSslMode::Require
        } else {
            PgSslMode::Disable
        });
    if let Some(ref password) = config.password {
        options = options.password(password);
    }
    if let Some(ref timezone) = config.timezone {
        options = options.options([("timezone", timezone.as_str())]);
    }
    Ok(options)
}
