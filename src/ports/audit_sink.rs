//! AuditSink port - where the engine reports what it did.
//!
//! Callers treat emission as best-effort: a failed `record` is logged and
//! never undoes the state change it describes.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: EventEnvelope) -> Result<(), DomainError>;
}
