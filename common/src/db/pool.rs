// PostgreSQL connection pool wrapper shared by all repositories

use crate::config::DatabaseConfig;
use crate::errors::DatabaseError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Database connection pool wrapper
/// Provides a managed connection pool to PostgreSQL with health checking
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    /// Create a new database connection pool
    ///
    /// # Errors
    /// Returns `DatabaseError::ConnectionFailed` if unable to establish connection
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Initializing database connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create database pool");
                DatabaseError::ConnectionFailed(e.to_string())
            })?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database connection pool initialized successfully"
        );

        Ok(Self { pool })
    }

    /// Wrap an already connected pool (tests, embedding applications)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Perform a health check on the database connection
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database health check failed");
                DatabaseError::HealthCheckFailed(e.to_string())
            })?;

        tracing::debug!("Database health check passed");
        Ok(())
    }

    /// Close the connection pool gracefully
    #[instrument(skip(self))]
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}
