//! Application handlers.
//!
//! Handlers orchestrate domain operations over the ports. Audit emission is
//! shared and best-effort.

pub mod audit;
pub mod period;
pub mod scoring;

pub use audit::AuditContext;
pub use period::{PeriodLockHandler, PeriodResolver};
pub use scoring::{
    BatchOutcome, DepartmentSummaryHandler, RankingService, RecordedScore, ScoreRecorder,
    ScoringOrchestrator, ScoringPorts,
};
