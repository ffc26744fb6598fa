//! PostgreSQL audit sink. Appends envelopes to `audit_logs`.

use async_trait::async_trait;
use sqlx::PgPool;

use super::read_error;
use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::AuditSink;

pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn record(&self, event: EventEnvelope) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                event_id, event_type, schema_version, aggregate_type, aggregate_id,
                occurred_at, payload, correlation_id, actor
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event.event_id.as_str())
        .bind(&event.event_type)
        .bind(event.schema_version as i32)
        .bind(&event.aggregate_type)
        .bind(&event.aggregate_id)
        .bind(event.occurred_at.as_datetime())
        .bind(&event.payload)
        .bind(&event.metadata.correlation_id)
        .bind(&event.metadata.actor)
        .execute(&self.pool)
        .await
        .map_err(read_error("Failed to record audit event"))?;

        Ok(())
    }
}
