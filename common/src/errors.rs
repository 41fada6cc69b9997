// Error handling framework
// Store failures are surfaced to callers instead of being logged and dropped

use thiserror::Error;

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    DuplicateKey(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),
}

impl DatabaseError {
    /// Short label used for the `outcome` metric dimension
    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => "connection_failed",
            DatabaseError::HealthCheckFailed(_) => "health_check_failed",
            DatabaseError::QueryFailed(_) => "query_failed",
            DatabaseError::NotFound(_) => "not_found",
            DatabaseError::DuplicateKey(_) => "duplicate_key",
            DatabaseError::ForeignKeyViolation(_) => "foreign_key_violation",
        }
    }
}

/// Configuration validation errors
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|code| code.into_owned());
                match code.as_deref() {
                    Some("23505") => DatabaseError::DuplicateKey(db_err.message().to_string()),
                    Some("23503") => {
                        DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                    }
                    _ => DatabaseError::QueryFailed(sqlx::Error::Database(db_err)),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionFailed(err.to_string())
            }
            _ => DatabaseError::QueryFailed(err),
        }
    }
}
