//! Score repository port.
//!
//! Scores are cached aggregates, one per `(user_id, period_id)`. The unique
//! key is enforced by the store, not by callers.

use async_trait::async_trait;

use crate::domain::foundation::{DepartmentId, DomainError, PeriodId, UserId};
use crate::domain::scoring::{RankAssignment, RankingScope, Score, ScoreDraft};

#[async_trait]
pub trait ScoreRepository: Send + Sync {
    async fn find(&self, user_id: UserId, period_id: PeriodId)
        -> Result<Option<Score>, DomainError>;

    /// Inserts a new score and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict` if a score for the same user and period exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, draft: ScoreDraft) -> Result<Score, DomainError>;

    /// Overwrites the computed fields of an existing score.
    ///
    /// Rank and percentile columns are not touched.
    ///
    /// # Errors
    ///
    /// - `ScoreNotFound` if the score does not exist
    async fn update(&self, score: &Score) -> Result<(), DomainError>;

    /// Scores of a period, optionally restricted to the department recorded
    /// on the score. Ordered by user id.
    async fn list_for_period(
        &self,
        period_id: PeriodId,
        department_id: Option<DepartmentId>,
    ) -> Result<Vec<Score>, DomainError>;

    /// Writes rank and percentile for one scope. Only the columns of that
    /// scope are written.
    async fn apply_rankings(
        &self,
        period_id: PeriodId,
        scope: RankingScope,
        assignments: &[RankAssignment],
    ) -> Result<(), DomainError>;

    /// Flags every score of the period as stale. Returns the number flagged.
    async fn mark_needs_recalculation(&self, period_id: PeriodId) -> Result<u64, DomainError>;

    /// Latest score of `user_id` for the given period, if any. Convenience
    /// used for trend lookups.
    async fn find_total(
        &self,
        user_id: UserId,
        period_id: PeriodId,
    ) -> Result<Option<f64>, DomainError> {
        Ok(self.find(user_id, period_id).await?.map(|s| s.total_score))
    }
}
