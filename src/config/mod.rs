//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `HR_SCORING` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use hr_scoring::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Batch concurrency: {}", config.scoring.max_concurrency);
//! ```

mod database;
mod error;
mod logging;
mod scoring;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use scoring::{LockedPeriodPolicy, ScoringConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// PostgreSQL connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Engine behavior (versioning, concurrency, lock policy)
    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `HR_SCORING` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `HR_SCORING__DATABASE__URL=...` -> `database.url = ...`
    /// - `HR_SCORING__SCORING__MAX_CONCURRENCY=8` -> `scoring.max_concurrency = 8`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("HR_SCORING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.scoring.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
