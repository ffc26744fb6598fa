//! In-memory score repository.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DepartmentId, DomainError, ErrorCode, PeriodId, ScoreId, UserId};
use crate::domain::scoring::{RankAssignment, RankingScope, Score, ScoreDraft};
use crate::ports::ScoreRepository;

#[derive(Default)]
struct State {
    next_id: i64,
    scores: BTreeMap<(PeriodId, UserId), Score>,
}

/// Scores keyed by `(period_id, user_id)`.
#[derive(Default)]
pub struct InMemoryScoreRepository {
    state: RwLock<State>,
}

impl InMemoryScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.scores.len()
    }

    /// Stores a score as-is, e.g. to seed a previous period.
    pub async fn seed(&self, score: Score) {
        let mut state = self.state.write().await;
        state.next_id = state.next_id.max(score.id.value());
        state.scores.insert((score.period_id, score.user_id), score);
    }
}

#[async_trait]
impl ScoreRepository for InMemoryScoreRepository {
    async fn find(&self, user_id: UserId, period_id: PeriodId) -> Result<Option<Score>, DomainError> {
        Ok(self.state.read().await.scores.get(&(period_id, user_id)).cloned())
    }

    async fn insert(&self, draft: ScoreDraft) -> Result<Score, DomainError> {
        let mut state = self.state.write().await;
        let key = (draft.period_id, draft.user_id);
        if state.scores.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "score for user {} in period {} already exists",
                draft.user_id, draft.period_id
            ))
            .with_detail("constraint", "scores_user_period_key"));
        }
        state.next_id += 1;
        let score = draft.into_score(ScoreId::new(state.next_id));
        state.scores.insert(key, score.clone());
        Ok(score)
    }

    async fn update(&self, score: &Score) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let stored = state
            .scores
            .get_mut(&(score.period_id, score.user_id))
            .filter(|s| s.id == score.id)
            .ok_or_else(|| DomainError::new(ErrorCode::ScoreNotFound, format!("score {} not found", score.id)))?;

        // Rank columns belong to the ranking pass.
        let mut updated = score.clone();
        updated.rank_department = stored.rank_department;
        updated.rank_company = stored.rank_company;
        updated.percentile_department = stored.percentile_department;
        updated.percentile_company = stored.percentile_company;
        *stored = updated;
        Ok(())
    }

    async fn list_for_period(
        &self,
        period_id: PeriodId,
        department_id: Option<DepartmentId>,
    ) -> Result<Vec<Score>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .scores
            .range((period_id, UserId::new(i64::MIN))..=(period_id, UserId::new(i64::MAX)))
            .map(|(_, s)| s)
            .filter(|s| department_id.map_or(true, |d| s.department_id == Some(d)))
            .cloned()
            .collect())
    }

    async fn apply_rankings(
        &self,
        period_id: PeriodId,
        scope: RankingScope,
        assignments: &[RankAssignment],
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        for assignment in assignments {
            if let Some(score) = state.scores.get_mut(&(period_id, assignment.user_id)) {
                score.apply_rank(scope, assignment.rank, assignment.percentile);
            }
        }
        Ok(())
    }

    async fn mark_needs_recalculation(&self, period_id: PeriodId) -> Result<u64, DomainError> {
        let mut state = self.state.write().await;
        let mut flagged = 0;
        for score in state.scores.values_mut().filter(|s| s.period_id == period_id) {
            score.needs_recalculation = true;
            flagged += 1;
        }
        Ok(flagged)
    }
}
