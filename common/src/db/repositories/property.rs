// Property repository implementation

use super::queries::property_queries;
use crate::config::DEFAULT_LISTING_LIMIT;
use crate::db::listing::{ListingQuery, PropertyFilter, QueryParam};
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{NewProperty, Property, PropertyListing};
use crate::telemetry;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::Postgres;
use std::time::Instant;
use tracing::instrument;

/// Repository for property-related database operations
#[derive(Clone)]
pub struct PropertyRepository {
    pool: DbPool,
    default_limit: i64,
}

impl PropertyRepository {
    /// Create a new PropertyRepository
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            default_limit: DEFAULT_LISTING_LIMIT,
        }
    }

    /// Override the cap used when `find_all` is called without one
    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    /// List properties matching `filter`, cheapest first, each with its
    /// average review rating. Properties without reviews never match.
    ///
    /// Issues exactly one query. An empty vector means nothing matched;
    /// store failures are returned as errors.
    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        filter: &PropertyFilter,
        limit: Option<i64>,
    ) -> Result<Vec<PropertyListing>, DatabaseError> {
        let query = ListingQuery::build(filter, limit.unwrap_or(self.default_limit));
        tracing::debug!(
            sql = query.sql(),
            params = ?query.params().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Built property listing query"
        );

        let started = Instant::now();
        let statement = query
            .params()
            .iter()
            .fold(sqlx::query_as::<_, PropertyListing>(query.sql()), bind_param);
        let result = statement
            .fetch_all(self.pool.pool())
            .await
            .map_err(DatabaseError::from);

        telemetry::record_query(
            "property.find_all",
            started.elapsed(),
            telemetry::outcome_label(&result),
        );
        match &result {
            Ok(rows) => tracing::debug!(count = rows.len(), "Found property listings"),
            Err(e) => tracing::error!(error = %e, "Failed to list properties"),
        }
        result
    }

    /// Insert a property and return the stored row
    ///
    /// # Errors
    /// `DatabaseError::ForeignKeyViolation` when `owner_id` is not a user
    #[instrument(skip(self, property), fields(owner_id = property.owner_id))]
    pub async fn create(&self, property: &NewProperty) -> Result<Property, DatabaseError> {
        let started = Instant::now();
        let result = sqlx::query_as::<_, Property>(&format!(
            r#"
            INSERT INTO properties (
                owner_id, title, description, thumbnail_photo_url, cover_photo_url,
                cost_per_night, street, city, province, post_code, country,
                parking_spaces, number_of_bathrooms, number_of_bedrooms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            property_queries::SELECT_ALL_COLUMNS
        ))
        .bind(property.owner_id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.thumbnail_photo_url)
        .bind(&property.cover_photo_url)
        .bind(property.cost_per_night)
        .bind(&property.street)
        .bind(&property.city)
        .bind(&property.province)
        .bind(&property.post_code)
        .bind(&property.country)
        .bind(property.parking_spaces)
        .bind(property.number_of_bathrooms)
        .bind(property.number_of_bedrooms)
        .fetch_one(self.pool.pool())
        .await
        .map_err(DatabaseError::from);

        telemetry::record_query(
            "property.create",
            started.elapsed(),
            telemetry::outcome_label(&result),
        );
        match &result {
            Ok(created) => tracing::info!(property_id = created.id, "Property created"),
            Err(e) => tracing::error!(error = %e, "Failed to create property"),
        }
        result
    }
}

fn bind_param<'q, O>(
    statement: QueryAs<'q, Postgres, O, PgArguments>,
    param: &'q QueryParam,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match param {
        QueryParam::Text(value) => statement.bind(value.as_str()),
        QueryParam::Int(value) => statement.bind(*value),
        QueryParam::Float(value) => statement.bind(*value),
        QueryParam::BigInt(value) => statement.bind(*value),
    }
}
