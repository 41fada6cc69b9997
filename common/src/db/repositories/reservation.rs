// Reservation repository implementation

use crate::config::DEFAULT_LISTING_LIMIT;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::GuestReservation;
use crate::telemetry;
use std::time::Instant;
use tracing::instrument;

/// Repository for reservation-related database operations
#[derive(Clone)]
pub struct ReservationRepository {
    pool: DbPool,
    default_limit: i64,
}

impl ReservationRepository {
    /// Create a new ReservationRepository
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            default_limit: DEFAULT_LISTING_LIMIT,
        }
    }

    /// Override the cap used when `find_by_guest` is called without one
    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Reservations made by a guest, earliest start date first.
    ///
    /// Only reservations whose property has at least one review are returned,
    /// since the average rating comes from an inner join on reviews.
    #[instrument(skip(self))]
    pub async fn find_by_guest(
        &self,
        guest_id: i32,
        limit: Option<i64>,
    ) -> Result<Vec<GuestReservation>, DatabaseError> {
        let limit = limit.unwrap_or(self.default_limit);
        let started = Instant::now();

        let result = sqlx::query_as::<_, GuestReservation>(
            r#"
            SELECT reservations.id, reservations.property_id, properties.title,
                   reservations.start_date, reservations.end_date,
                   properties.cost_per_night,
                   AVG(property_reviews.rating)::float8 AS average_rating
            FROM properties
            INNER JOIN reservations ON properties.id = reservations.property_id
            INNER JOIN property_reviews ON reservations.id = property_reviews.reservation_id
            WHERE reservations.guest_id = $1
            GROUP BY properties.id, reservations.id
            ORDER BY reservations.start_date
            LIMIT $2
            "#,
        )
        .bind(guest_id)
        .bind(limit)
        .fetch_all(self.pool.pool())
        .await
        .map_err(DatabaseError::from);

        telemetry::record_query(
            "reservation.find_by_guest",
            started.elapsed(),
            telemetry::outcome_label(&result),
        );
        match &result {
            Ok(rows) => tracing::debug!(count = rows.len(), "Found guest reservations"),
            Err(e) => tracing::error!(error = %e, "Failed to list guest reservations"),
        }
        result
    }
}
