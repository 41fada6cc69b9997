// Data-access layer for the LightBnB rental application

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod telemetry;
