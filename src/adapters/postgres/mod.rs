//! PostgreSQL adapters - Database implementations for the scoring ports.
//!
//! - `PostgresEventSource`, `PostgresRuleSource`, `PostgresEmployeeDirectory` -
//!   read-only queries over the event, rule and user tables
//! - `PostgresPeriodRepository` - periods with the calendar-key unique index
//! - `PostgresScoreRepository` - cached scores and rankings
//! - `PostgresAuditSink` - `audit_logs` writer

mod audit_sink;
mod period_repository;
mod score_repository;
mod sources;

pub use audit_sink::PostgresAuditSink;
pub use period_repository::PostgresPeriodRepository;
pub use score_repository::PostgresScoreRepository;
pub use sources::{PostgresEmployeeDirectory, PostgresEventSource, PostgresRuleSource};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Opens a connection pool sized from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::database(format!("Failed to connect to database: {}", e)))
}

/// Applies the bundled schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
}

/// Maps a unique violation on `constraint` to a conflict, anything else to
/// a database error.
pub(crate) fn map_write_error(err: sqlx::Error, constraint: &str, context: &str) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(constraint) {
            return DomainError::conflict(format!("{}: unique constraint {} violated", context, constraint))
                .with_detail("constraint", constraint);
        }
    }
    DomainError::database(format!("{}: {}", context, err))
}

pub(crate) fn read_error(context: &str) -> impl FnOnce(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(format!("{}: {}", context, e))
}

/// Converts a non-negative INTEGER column.
pub(crate) fn non_negative(value: i32, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid {} value: {}", column, value),
        )
    })
}

pub(crate) fn to_i32(value: u32, column: &str) -> Result<i32, DomainError> {
    i32::try_from(value).map_err(|_| DomainError::validation(column, format!("{} out of range", value)))
}
