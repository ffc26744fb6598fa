//! Best-effort audit emission shared by the handlers.

use serde::Serialize;
use tracing::warn;

use crate::domain::foundation::{DomainEvent, EventEnvelope, EventId, UserId};
use crate::ports::AuditSink;

/// Who triggered an operation and which run it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub actor: String,
    pub correlation_id: Option<String>,
}

impl AuditContext {
    /// Scheduled or administrative runs without a named user.
    pub fn system() -> Self {
        Self {
            actor: "system".to_string(),
            correlation_id: None,
        }
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            actor: format!("user:{}", user_id),
            correlation_id: None,
        }
    }

    /// Same actor, fresh correlation id shared by every event of one batch.
    pub fn for_batch(&self) -> Self {
        Self {
            actor: self.actor.clone(),
            correlation_id: Some(EventId::new().to_string()),
        }
    }
}

impl Default for AuditContext {
    fn default() -> Self {
        Self::system()
    }
}

/// Records `event` on `sink`. Failures are logged and swallowed; the state
/// change the event describes has already been persisted.
pub(crate) async fn emit<E>(sink: &dyn AuditSink, event: &E, ctx: &AuditContext)
where
    E: DomainEvent + Serialize,
{
    let mut envelope = match EventEnvelope::from_event(event) {
        Ok(envelope) => envelope.with_actor(ctx.actor.clone()),
        Err(e) => {
            warn!(event_type = event.event_type(), error = %e, "Failed to serialize audit event");
            return;
        }
    };
    if let Some(correlation_id) = &ctx.correlation_id {
        envelope = envelope.with_correlation_id(correlation_id.clone());
    }

    if let Err(e) = sink.record(envelope).await {
        warn!(
            event_type = event.event_type(),
            aggregate_id = %event.aggregate_id(),
            error = %e,
            "Audit sink rejected event"
        );
    }
}
