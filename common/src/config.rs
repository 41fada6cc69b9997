// Configuration management with layered configuration (file, env)

use crate::errors::ValidationError;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of rows a listing returns when the caller gives no cap
pub const DEFAULT_LISTING_LIMIT: i64 = 10;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    pub default_limit: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LISTING_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: Option<u16>,
    pub tracing_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_port: None,
            tracing_endpoint: None,
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Not committed to git
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("LIGHTBNB")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.database.url.is_empty() {
            return Err(ValidationError::MissingField("database.url".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "database.max_connections".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ValidationError::InvalidFieldValue {
                field: "database.min_connections".to_string(),
                reason: "must not exceed max_connections".to_string(),
            });
        }
        if self.listing.default_limit <= 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "listing.default_limit".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.observability.metrics_port == Some(0) {
            return Err(ValidationError::InvalidFieldValue {
                field: "observability.metrics_port".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/lightbnb".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_seconds: default_connect_timeout_seconds(),
            },
            listing: ListingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
