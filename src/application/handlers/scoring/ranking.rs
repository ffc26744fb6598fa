//! RankingService - ranks a period population and persists the result.

use std::sync::Arc;

use tracing::info;

use crate::application::handlers::audit::{emit, AuditContext};
use crate::domain::foundation::{EventId, Timestamp};
use crate::domain::period::Period;
use crate::domain::scoring::{RankAssignment, RankingCalculator, RankingComputed, RankingScope, ScoringError};
use crate::ports::{AuditSink, ScoreRepository};

pub struct RankingService {
    scores: Arc<dyn ScoreRepository>,
    audit: Arc<dyn AuditSink>,
}

impl RankingService {
    pub fn new(scores: Arc<dyn ScoreRepository>, audit: Arc<dyn AuditSink>) -> Self {
        Self { scores, audit }
    }

    /// Ranks every stored score of `period` within `scope`.
    ///
    /// Department populations are selected by the department recorded on
    /// each score. Must run after all scores of the population are written.
    pub async fn rank(
        &self,
        period: &Period,
        scope: RankingScope,
        ctx: &AuditContext,
    ) -> Result<Vec<RankAssignment>, ScoringError> {
        let started = Timestamp::now();
        let population = self
            .scores
            .list_for_period(period.id, scope.department())
            .await?;
        let assignments = RankingCalculator::rank(&population);

        self.scores
            .apply_rankings(period.id, scope, &assignments)
            .await?;
        let finished = Timestamp::now();
        let duration_ms = finished.millis_since(&started);
        info!(
            period = %period.key,
            scope = %scope,
            ranked = assignments.len(),
            duration_ms,
            "Rankings applied"
        );

        let event = RankingComputed {
            event_id: EventId::new(),
            period_id: period.id,
            scope,
            ranked_count: assignments.len() as u32,
            duration_ms,
            computed_at: finished,
        };
        emit(self.audit.as_ref(), &event, ctx).await;

        Ok(assignments)
    }
}
