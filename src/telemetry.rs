//! Tracing subscriber setup.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },

    #[error("telemetry error: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// Builds the filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|source| TelemetryError::EnvFilter {
            value: config.level.clone(),
            source,
        }),
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Compact => builder
            .with_target(false)
            .compact()
            .with_ansi(false)
            .try_init()
            .map_err(TelemetryError::Subscriber),
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .try_init()
            .map_err(TelemetryError::Subscriber),
    }
}
