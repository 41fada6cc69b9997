//! Filtered property listing query.
//!
//! [`ListingQuery::build`] turns a [`PropertyFilter`] and a row cap into one
//! SQL statement plus its positional parameters. Nothing here touches the
//! database; [`crate::db::repositories::PropertyRepository`] executes the
//! result.
//!
//! Predicates are collected per stage (WHERE, then HAVING) as
//! (expression, operator, value) triples and only numbered when the
//! statement is rendered, so `$n` always matches the n-th parameter no
//! matter which filters were skipped.

use super::repositories::queries::property_queries;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

lazy_static! {
    // Longest numeric prefix accepted by a lenient float parse: "12.5abc" -> "12.5"
    static ref LEADING_FLOAT: Regex =
        Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
            .expect("leading float pattern is valid");
}

/// Parse the longest numeric prefix of `input`, ignoring leading whitespace.
///
/// Returns `None` when no prefix is numeric (`"abc"`, `""`, `"."`).
/// Trailing garbage is ignored, so `"50 dollars"` parses as `50.0`.
pub fn parse_leading_float(input: &str) -> Option<f64> {
    let trimmed = input.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let prefix = LEADING_FLOAT.find(trimmed)?;
    prefix.as_str().parse::<f64>().ok()
}

/// A numeric filter value as it arrives from a query string or a JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNumber {
    Number(f64),
    Text(String),
}

impl FilterNumber {
    /// Whether the value counts as supplied. Empty strings, zero and NaN do
    /// not; any other string does, even one that will not parse.
    pub fn is_set(&self) -> bool {
        match self {
            FilterNumber::Number(n) => *n != 0.0 && !n.is_nan(),
            FilterNumber::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric value, if any
    pub fn parse(&self) -> Option<f64> {
        match self {
            FilterNumber::Number(n) if n.is_nan() => None,
            FilterNumber::Number(n) => Some(*n),
            FilterNumber::Text(s) => parse_leading_float(s),
        }
    }

    /// Whole currency units converted to cents. Unparsable input yields NaN.
    fn to_cents(&self) -> f64 {
        100.0 * self.parse().unwrap_or(f64::NAN)
    }
}

impl From<&str> for FilterNumber {
    fn from(value: &str) -> Self {
        FilterNumber::Text(value.to_string())
    }
}

impl From<String> for FilterNumber {
    fn from(value: String) -> Self {
        FilterNumber::Text(value)
    }
}

impl From<f64> for FilterNumber {
    fn from(value: f64) -> Self {
        FilterNumber::Number(value)
    }
}

impl From<i32> for FilterNumber {
    fn from(value: i32) -> Self {
        FilterNumber::Number(f64::from(value))
    }
}

/// Optional filters for the property listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFilter {
    pub city: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_id")]
    pub owner_id: Option<i32>,
    /// Whole currency units
    pub minimum_price_per_night: Option<FilterNumber>,
    /// Whole currency units
    pub maximum_price_per_night: Option<FilterNumber>,
    pub minimum_rating: Option<FilterNumber>,
}

// Ids arrive as JSON numbers or as query-string text; an empty string means unset
fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LenientId {
        Number(i32),
        Text(String),
    }

    match Option::<LenientId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(LenientId::Number(id)) => Ok(Some(id)),
        Some(LenientId::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(LenientId::Text(text)) => text
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid owner_id {:?}: {}", text, e))),
    }
}

/// A value bound to a positional placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Int(i32),
    Float(f64),
    BigInt(i64),
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryParam::Text(s) => write!(f, "{:?}", s),
            QueryParam::Int(n) => write!(f, "{}", n),
            QueryParam::Float(n) => write!(f, "{}", n),
            QueryParam::BigInt(n) => write!(f, "{}", n),
        }
    }
}

struct Predicate {
    expression: &'static str,
    operator: &'static str,
    value: QueryParam,
}

impl Predicate {
    fn new(expression: &'static str, operator: &'static str, value: QueryParam) -> Self {
        Self {
            expression,
            operator,
            value,
        }
    }
}

/// A rendered listing statement and its parameters, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    sql: String,
    params: Vec<QueryParam>,
}

impl ListingQuery {
    /// Build the listing statement for `filter`, returning at most `limit` rows
    pub fn build(filter: &PropertyFilter, limit: i64) -> Self {
        let mut where_stage = Vec::new();

        if let Some(city) = filter.city.as_deref().filter(|c| !c.is_empty()) {
            where_stage.push(Predicate::new(
                "properties.city",
                "=",
                QueryParam::Text(city.to_string()),
            ));
        }

        // Serial ids start at 1, so 0 is treated as unset
        if let Some(owner_id) = filter.owner_id.filter(|id| *id != 0) {
            where_stage.push(Predicate::new(
                "properties.owner_id",
                "=",
                QueryParam::Int(owner_id),
            ));
        }

        if let Some(min_price) = filter.minimum_price_per_night.as_ref().filter(|v| v.is_set()) {
            where_stage.push(Predicate::new(
                "properties.cost_per_night",
                ">=",
                QueryParam::Float(min_price.to_cents()),
            ));
        }

        if let Some(max_price) = filter.maximum_price_per_night.as_ref().filter(|v| v.is_set()) {
            where_stage.push(Predicate::new(
                "properties.cost_per_night",
                "<=",
                QueryParam::Float(max_price.to_cents()),
            ));
        }

        // A rating of zero filters nothing out and is treated as absent
        let having = filter
            .minimum_rating
            .as_ref()
            .and_then(FilterNumber::parse)
            .filter(|rating| *rating != 0.0)
            .map(|rating| Predicate::new("AVG(property_reviews.rating)", ">=", QueryParam::Float(rating)));

        let mut params = Vec::with_capacity(where_stage.len() + 2);
        let mut sql = format!(
            "SELECT {}, AVG(property_reviews.rating)::float8 AS average_rating\n\
             FROM properties\n\
             INNER JOIN property_reviews ON property_reviews.property_id = properties.id",
            property_queries::SELECT_QUALIFIED_COLUMNS
        );

        for (index, predicate) in where_stage.into_iter().enumerate() {
            let keyword = if index == 0 { "WHERE" } else { "AND" };
            params.push(predicate.value);
            sql.push_str(&format!(
                "\n{} {} {} ${}",
                keyword,
                predicate.expression,
                predicate.operator,
                params.len()
            ));
        }

        sql.push_str("\nGROUP BY properties.id");

        if let Some(predicate) = having {
            params.push(predicate.value);
            sql.push_str(&format!(
                "\nHAVING {} {} ${}",
                predicate.expression,
                predicate.operator,
                params.len()
            ));
        }

        params.push(QueryParam::BigInt(limit));
        sql.push_str(&format!(
            "\nORDER BY properties.cost_per_night\nLIMIT ${}",
            params.len()
        ));

        Self { sql, params }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vancouver_filter() -> PropertyFilter {
        PropertyFilter {
            city: Some("Vancouver".to_string()),
            minimum_price_per_night: Some("50".into()),
            maximum_price_per_night: Some("200".into()),
            minimum_rating: Some("4".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_filter_only_binds_limit() {
        let query = ListingQuery::build(&PropertyFilter::default(), 10);

        assert_eq!(query.params(), &[QueryParam::BigInt(10)]);
        assert!(!query.sql().contains("WHERE"));
        assert!(!query.sql().contains("HAVING"));
        assert!(query.sql().contains("GROUP BY properties.id"));
        assert!(query
            .sql()
            .ends_with("ORDER BY properties.cost_per_night\nLIMIT $1"));
    }

    #[test]
    fn test_all_filters_bind_in_fixed_order() {
        let query = ListingQuery::build(&vancouver_filter(), 5);

        assert_eq!(
            query.params(),
            &[
                QueryParam::Text("Vancouver".to_string()),
                QueryParam::Float(5000.0),
                QueryParam::Float(20000.0),
                QueryParam::Float(4.0),
                QueryParam::BigInt(5),
            ]
        );

        let sql = query.sql();
        assert!(sql.contains("WHERE properties.city = $1"));
        assert!(sql.contains("AND properties.cost_per_night >= $2"));
        assert!(sql.contains("AND properties.cost_per_night <= $3"));
        assert!(sql.contains("HAVING AVG(property_reviews.rating) >= $4"));
        assert!(sql.contains("LIMIT $5"));

        let where_at = sql.find("WHERE").unwrap();
        let group_at = sql.find("GROUP BY").unwrap();
        let having_at = sql.find("HAVING").unwrap();
        let order_at = sql.find("ORDER BY").unwrap();
        assert!(where_at < group_at && group_at < having_at && having_at < order_at);
    }

    #[test]
    fn test_first_predicate_uses_where_even_when_city_absent() {
        let filter = PropertyFilter {
            owner_id: Some(3),
            maximum_price_per_night: Some(150.into()),
            ..Default::default()
        };
        let query = ListingQuery::build(&filter, 10);

        assert!(query.sql().contains("WHERE properties.owner_id = $1"));
        assert!(query.sql().contains("AND properties.cost_per_night <= $2"));
        assert_eq!(query.sql().matches("WHERE").count(), 1);
        assert_eq!(
            query.params(),
            &[QueryParam::Int(3), QueryParam::Float(15000.0), QueryParam::BigInt(10)]
        );
    }

    #[test]
    fn test_rating_only_is_numbered_after_group_by() {
        let filter = PropertyFilter {
            minimum_rating: Some(3.5.into()),
            ..Default::default()
        };
        let query = ListingQuery::build(&filter, 20);

        assert!(!query.sql().contains("WHERE"));
        assert!(query.sql().contains("HAVING AVG(property_reviews.rating) >= $1"));
        assert!(query.sql().contains("LIMIT $2"));
        assert_eq!(
            query.params(),
            &[QueryParam::Float(3.5), QueryParam::BigInt(20)]
        );
    }

    #[test]
    fn test_non_numeric_rating_is_same_as_absent() {
        let with_garbage = PropertyFilter {
            city: Some("Vancouver".to_string()),
            minimum_rating: Some("abc".into()),
            ..Default::default()
        };
        let without = PropertyFilter {
            city: Some("Vancouver".to_string()),
            ..Default::default()
        };

        assert_eq!(
            ListingQuery::build(&with_garbage, 10),
            ListingQuery::build(&without, 10)
        );
    }

    #[test]
    fn test_zero_rating_is_ignored() {
        let filter = PropertyFilter {
            minimum_rating: Some("0".into()),
            ..Default::default()
        };
        assert_eq!(
            ListingQuery::build(&filter, 10),
            ListingQuery::build(&PropertyFilter::default(), 10)
        );
    }

    #[test]
    fn test_non_numeric_price_binds_nan() {
        let filter = PropertyFilter {
            minimum_price_per_night: Some("cheap".into()),
            ..Default::default()
        };
        let query = ListingQuery::build(&filter, 10);

        assert!(query.sql().contains("WHERE properties.cost_per_night >= $1"));
        assert!(matches!(query.params()[0], QueryParam::Float(v) if v.is_nan()));
        assert_eq!(query.params().len(), 2);
    }

    #[test]
    fn test_price_conversion_keeps_float_precision() {
        let filter = PropertyFilter {
            minimum_price_per_night: Some("19.99".into()),
            ..Default::default()
        };
        let query = ListingQuery::build(&filter, 10);

        assert_eq!(query.params()[0], QueryParam::Float(100.0 * 19.99));
        assert_ne!(query.params()[0], QueryParam::Float(1999.0));
    }

    #[test]
    fn test_empty_strings_and_zero_prices_are_absent() {
        let filter = PropertyFilter {
            city: Some(String::new()),
            minimum_price_per_night: Some("".into()),
            maximum_price_per_night: Some(0.into()),
            ..Default::default()
        };
        let query = ListingQuery::build(&filter, 10);

        assert_eq!(query.params(), &[QueryParam::BigInt(10)]);
    }

    #[test]
    fn test_string_zero_price_is_still_applied() {
        let filter = PropertyFilter {
            minimum_price_per_night: Some("0".into()),
            ..Default::default()
        };
        let query = ListingQuery::build(&filter, 10);

        assert_eq!(query.params()[0], QueryParam::Float(0.0));
    }

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("50"), Some(50.0));
        assert_eq!(parse_leading_float("  4"), Some(4.0));
        assert_eq!(parse_leading_float("50abc"), Some(50.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("5."), Some(5.0));
        assert_eq!(parse_leading_float("-2.5e1x"), Some(-25.0));
        assert_eq!(parse_leading_float("1e"), Some(1.0));
        assert_eq!(parse_leading_float("0x10"), Some(0.0));
        assert_eq!(parse_leading_float("Infinity"), Some(f64::INFINITY));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float("-"), None);
    }

    #[test]
    fn test_filter_deserializes_strings_and_numbers() {
        let filter: PropertyFilter = serde_json::from_value(serde_json::json!({
            "city": "Vancouver",
            "minimum_price_per_night": "50",
            "maximum_price_per_night": 200,
            "minimum_rating": 4.5
        }))
        .unwrap();

        assert_eq!(filter.city.as_deref(), Some("Vancouver"));
        assert_eq!(filter.minimum_price_per_night, Some(FilterNumber::Text("50".to_string())));
        assert_eq!(filter.maximum_price_per_night, Some(FilterNumber::Number(200.0)));
        assert_eq!(filter.minimum_rating, Some(FilterNumber::Number(4.5)));
        assert!(filter.owner_id.is_none());
    }

    #[test]
    fn test_owner_id_accepts_query_string_text() {
        let filter: PropertyFilter =
            serde_json::from_value(serde_json::json!({ "owner_id": "3" })).unwrap();
        assert_eq!(filter.owner_id, Some(3));

        let numeric: PropertyFilter =
            serde_json::from_value(serde_json::json!({ "owner_id": 3 })).unwrap();
        assert_eq!(numeric.owner_id, Some(3));

        let blank: PropertyFilter =
            serde_json::from_value(serde_json::json!({ "owner_id": "" })).unwrap();
        assert!(blank.owner_id.is_none());

        let missing: PropertyFilter = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(missing.owner_id.is_none());
    }

    #[test]
    fn test_non_numeric_owner_id_is_rejected() {
        let result: Result<PropertyFilter, _> =
            serde_json::from_value(serde_json::json!({ "owner_id": "abc" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_owner_id_is_absent() {
        let filter = PropertyFilter {
            owner_id: Some(0),
            ..Default::default()
        };
        let query = ListingQuery::build(&filter, 10);

        assert!(!query.sql().contains("owner_id"));
        assert_eq!(query.params(), &[QueryParam::BigInt(10)]);
    }

    #[test]
    fn test_query_param_display() {
        assert_eq!(QueryParam::Text("Vancouver".to_string()).to_string(), "\"Vancouver\"");
        assert_eq!(QueryParam::Float(5000.0).to_string(), "5000");
        assert_eq!(QueryParam::BigInt(10).to_string(), "10");
    }
}
