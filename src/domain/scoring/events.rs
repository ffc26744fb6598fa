//! Scoring domain events.
//!
//! Emitted to the audit sink after the corresponding state change has been
//! persisted. Emission failures never roll back the change.

use serde::{Deserialize, Serialize};

use super::{PerformanceTrend, RankingScope};
use crate::domain::foundation::{EventId, PeriodId, ScoreId, Timestamp, UserId};

/// A score row was created or recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComputed {
    pub event_id: EventId,
    pub score_id: ScoreId,
    pub user_id: UserId,
    pub period_id: PeriodId,
    pub period_key: String,
    pub total_score: f64,
    pub previous_total_score: Option<f64>,
    pub trend: PerformanceTrend,
    pub total_events: u32,
    pub positive_events: u32,
    pub negative_events: u32,
    pub created: bool,
    /// Time spent reading events, aggregating and writing the row.
    pub duration_ms: u64,
    pub computed_at: Timestamp,
}

crate::domain_event!(
    ScoreComputed,
    event_type = "score.computed.v1",
    aggregate_id = score_id,
    aggregate_type = "Score",
    occurred_at = computed_at,
    event_id = event_id
);

/// Ranks were written for one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingComputed {
    pub event_id: EventId,
    pub period_id: PeriodId,
    pub scope: RankingScope,
    pub ranked_count: u32,
    pub duration_ms: u64,
    pub computed_at: Timestamp,
}

crate::domain_event!(
    RankingComputed,
    event_type = "ranking.computed.v1",
    aggregate_id = period_id,
    aggregate_type = "Period",
    occurred_at = computed_at,
    event_id = event_id
);

/// A department or company batch finished, ranking included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoresBatchComputed {
    pub event_id: EventId,
    pub period_id: PeriodId,
    pub period_key: String,
    pub scope: RankingScope,
    pub forced: bool,
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    pub duration_ms: u64,
    pub completed_at: Timestamp,
}

crate::domain_event!(
    ScoresBatchComputed,
    event_type = "scores.batch_computed.v1",
    aggregate_id = period_id,
    aggregate_type = "Period",
    occurred_at = completed_at,
    event_id = event_id
);

/// A full-period recalculation finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecalculated {
    pub event_id: EventId,
    pub period_id: PeriodId,
    pub period_key: String,
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    pub duration_ms: u64,
    pub completed_at: Timestamp,
}

crate::domain_event!(
    PeriodRecalculated,
    event_type = "period.recalculated.v1",
    aggregate_id = period_id,
    aggregate_type = "Period",
    occurred_at = completed_at,
    event_id = event_id
);

/// A period was locked or unlocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodLockChanged {
    pub event_id: EventId,
    pub period_id: PeriodId,
    pub period_key: String,
    pub locked: bool,
    pub actor: Option<UserId>,
    pub changed_at: Timestamp,
}

crate::domain_event!(
    PeriodLockChanged,
    event_type = "period.lock_changed.v1",
    aggregate_id = period_id,
    aggregate_type = "Period",
    occurred_at = changed_at,
    event_id = event_id
);
