//! In-memory adapters for every scoring port.

mod audit_sink;
mod period_repository;
mod score_repository;
mod sources;

pub use audit_sink::{InMemoryAuditSink, TracingAuditSink};
pub use period_repository::InMemoryPeriodRepository;
pub use score_repository::InMemoryScoreRepository;
pub use sources::{InMemoryEmployeeDirectory, InMemoryEventSource, InMemoryRuleSource};
