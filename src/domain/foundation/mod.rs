//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, events and error types that form the
//! vocabulary of the scoring engine.

mod errors;
mod events;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{DomainEvent, EventEnvelope, EventId, EventMetadata};
pub use ids::{DepartmentId, PerformanceEventId, PeriodId, RuleId, ScoreId, UserId};
pub use timestamp::Timestamp;
