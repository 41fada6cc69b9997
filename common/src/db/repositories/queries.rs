// SQL column lists shared by the repositories

/// SQL query fragments for users table
pub mod user_queries {
    pub const SELECT_ALL_COLUMNS: &str = "id, name, email, password";
}

/// SQL query fragments for properties table
pub mod property_queries {
    pub const SELECT_ALL_COLUMNS: &str = r#"id, owner_id, title, description,
        thumbnail_photo_url, cover_photo_url, cost_per_night,
        parking_spaces, number_of_bathrooms, number_of_bedrooms,
        country, street, city, province, post_code, active"#;

    /// Same columns, table-qualified for joins against reviews/reservations
    pub const SELECT_QUALIFIED_COLUMNS: &str = r#"properties.id, properties.owner_id,
        properties.title, properties.description,
        properties.thumbnail_photo_url, properties.cover_photo_url,
        properties.cost_per_night, properties.parking_spaces,
        properties.number_of_bathrooms, properties.number_of_bedrooms,
        properties.country, properties.street, properties.city,
        properties.province, properties.post_code, properties.active"#;
}
