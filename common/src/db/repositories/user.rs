// User repository implementation

use super::queries::user_queries;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{NewUser, User};
use crate::telemetry;
use std::time::Instant;
use tracing::instrument;

/// Repository for user-related database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Find a user by email. Emails are unique, so at most one row matches.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let started = Instant::now();
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            user_queries::SELECT_ALL_COLUMNS
        ))
        .bind(email)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(DatabaseError::from);

        telemetry::record_query(
            "user.find_by_email",
            started.elapsed(),
            telemetry::outcome_label(&result),
        );
        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to look up user by email");
        }
        result
    }

    /// Find a user by ID
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        let started = Instant::now();
        let result = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            user_queries::SELECT_ALL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(DatabaseError::from);

        telemetry::record_query(
            "user.find_by_id",
            started.elapsed(),
            telemetry::outcome_label(&result),
        );
        if let Err(e) = &result {
            tracing::error!(error = %e, user_id = id, "Failed to look up user by id");
        }
        result
    }

    /// Insert a user and return the stored row
    ///
    /// # Errors
    /// `DatabaseError::DuplicateKey` when the email is already registered
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create(&self, user: &NewUser) -> Result<User, DatabaseError> {
        let started = Instant::now();
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            user_queries::SELECT_ALL_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(self.pool.pool())
        .await
        .map_err(DatabaseError::from);

        telemetry::record_query(
            "user.create",
            started.elapsed(),
            telemetry::outcome_label(&result),
        );
        match &result {
            Ok(created) => tracing::info!(user_id = created.id, "User created"),
            Err(e) => tracing::error!(error = %e, "Failed to create user"),
        }
        result
    }
}
