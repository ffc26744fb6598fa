//! Scoring module - turns approved performance events into period scores.
//!
//! The pipeline is pure: select and group events, apply per-rule caps,
//! accumulate totals, then rank a population. Persistence and orchestration
//! live in the application layer.

mod aggregator;
mod cap_applier;
mod errors;
mod event;
mod events;
mod ranking;
mod rule;
mod score;
mod summary;

pub use aggregator::{EventAggregator, GroupedEvents};
pub use cap_applier::{RuleBreakdownEntry, RuleCapApplier, ScoreAggregate};
pub use errors::ScoringError;
pub use event::{EventStatus, PerformanceEvent};
pub use events::{
    PeriodLockChanged, PeriodRecalculated, RankingComputed, ScoreComputed, ScoresBatchComputed,
};
pub use ranking::{RankAssignment, RankingCalculator, RankingScope};
pub use rule::{Rule, RulePackWindow, RuleSet};
pub use score::{PerformanceTrend, Score, ScoreComputation, ScoreDraft, ScoreGrade, ScoreTrend};
pub use summary::{BatchError, BatchSummary, DepartmentSummary, TopPerformer};
