//! In-memory audit sink. Captures envelopes for assertions.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::AuditSink;

#[derive(Default)]
pub struct InMemoryAuditSink {
    recorded: RwLock<Vec<EventEnvelope>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded(&self) -> Vec<EventEnvelope> {
        self.recorded.read().await.clone()
    }

    pub async fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.recorded
            .read()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.recorded.write().await.push(event);
        Ok(())
    }
}

/// Writes audit events to the log instead of storing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: EventEnvelope) -> Result<(), DomainError> {
        tracing::info!(
            target: "audit",
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            event_id = %event.event_id,
            payload = %event.payload,
            "audit event"
        );
        Ok(())
    }
}
