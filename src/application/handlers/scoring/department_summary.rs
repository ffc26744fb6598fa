//! DepartmentSummaryHandler - read-side roll-up of a department's scores.

use std::sync::Arc;

use tracing::debug;

use crate::domain::foundation::DepartmentId;
use crate::domain::period::PeriodKey;
use crate::domain::scoring::{DepartmentSummary, ScoringError};
use crate::ports::{PeriodRepository, ScoreRepository};

pub struct DepartmentSummaryHandler {
    periods: Arc<dyn PeriodRepository>,
    scores: Arc<dyn ScoreRepository>,
}

impl DepartmentSummaryHandler {
    pub fn new(periods: Arc<dyn PeriodRepository>, scores: Arc<dyn ScoreRepository>) -> Self {
        Self { periods, scores }
    }

    /// Summarizes the stored scores; computes nothing. A period that was never
    /// scored yields an empty summary.
    pub async fn handle(
        &self,
        department_id: DepartmentId,
        key: PeriodKey,
    ) -> Result<DepartmentSummary, ScoringError> {
        let Some(period) = self.periods.find_by_key(&key).await? else {
            debug!(period = %key, "Period not found, returning empty summary");
            return Ok(DepartmentSummary::from_scores(department_id, key, &[]));
        };

        let scores = self
            .scores
            .list_for_period(period.id, Some(department_id))
            .await?;
        Ok(DepartmentSummary::from_scores(department_id, key, &scores))
    }
}
