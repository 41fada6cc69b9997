// Bootstrap utilities for embedding applications
// Loads settings, starts telemetry and hands out repositories over one pool

use crate::config::Settings;
use crate::db::repositories::{PropertyRepository, ReservationRepository, UserRepository};
use crate::db::DbPool;
use crate::telemetry;
use anyhow::{Context, Result};
use tracing::info;

/// All repositories sharing a single connection pool
#[derive(Clone)]
pub struct Repositories {
    pub pool: DbPool,
    pub users: UserRepository,
    pub reservations: ReservationRepository,
    pub properties: PropertyRepository,
}

impl Repositories {
    /// Build repositories over an existing pool, using the configured listing cap
    pub fn new(pool: DbPool, settings: &Settings) -> Self {
        let default_limit = settings.listing.default_limit;
        Self {
            users: UserRepository::new(pool.clone()),
            reservations: ReservationRepository::new(pool.clone())
                .with_default_limit(default_limit),
            properties: PropertyRepository::new(pool.clone()).with_default_limit(default_limit),
            pool,
        }
    }
}

/// Validate settings, connect the pool and verify it answers
///
/// # Errors
/// Returns error if settings are invalid or the database is unreachable
#[tracing::instrument(skip(settings))]
pub async fn connect(settings: &Settings) -> Result<Repositories> {
    settings
        .validate()
        .context("Invalid configuration")?;

    let pool = DbPool::new(&settings.database)
        .await
        .context("Failed to initialize database pool")?;

    pool.health_check()
        .await
        .context("Database did not answer health check")?;

    info!(
        default_limit = settings.listing.default_limit,
        "Repositories initialized"
    );
    Ok(Repositories::new(pool, settings))
}

/// Start logging and, when configured, metrics export
///
/// # Errors
/// Returns error if a subscriber is already installed or the exporter fails to bind
pub fn init_telemetry(settings: &Settings) -> Result<()> {
    let observability = &settings.observability;
    telemetry::init_logging(
        &observability.log_level,
        observability.tracing_endpoint.as_deref(),
    )?;

    if let Some(port) = observability.metrics_port {
        telemetry::init_metrics(port)?;
    }

    Ok(())
}

/// Close the pool and flush exported spans
///
/// Pending acquires fail with `DatabaseError::ConnectionFailed` once the pool is closed.
pub async fn shutdown(repos: &Repositories, settings: &Settings) {
    repos.pool.close().await;

    if settings.observability.tracing_endpoint.is_some() {
        telemetry::shutdown_tracer();
    }
    info!("Repositories shut down");
}
