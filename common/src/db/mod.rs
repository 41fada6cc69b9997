// Database layer module

pub mod listing;
pub mod pool;
pub mod repositories;

pub use listing::{FilterNumber, ListingQuery, PropertyFilter, QueryParam};
pub use pool::DbPool;
