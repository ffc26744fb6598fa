//! Application layer - handlers that drive the scoring domain through ports.

pub mod handlers;

pub use handlers::{
    AuditContext, BatchOutcome, DepartmentSummaryHandler, PeriodLockHandler, PeriodResolver,
    RankingService, RecordedScore, ScoreRecorder, ScoringOrchestrator, ScoringPorts,
};
