use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// User Models
// ============================================================================

/// A registered user. `password` holds a hash produced by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Fields required to register a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

// ============================================================================
// Property Models
// ============================================================================

/// A rentable property. `cost_per_night` is stored in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    pub cost_per_night: i32,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
    pub country: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub active: bool,
}

/// A property row returned by the listing query, with its review average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PropertyListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub property: Property,
    pub average_rating: f64,
}

/// Fields required to publish a property. Columns omitted here use their
/// database defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProperty {
    pub owner_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    /// Cents
    pub cost_per_night: i32,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub country: String,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
}

// ============================================================================
// Reservation Models
// ============================================================================

/// A guest's reservation summarised with the reserved property's details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GuestReservation {
    pub id: i32,
    pub property_id: i32,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub cost_per_night: i32,
    pub average_rating: f64,
}
