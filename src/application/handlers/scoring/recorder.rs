//! ScoreRecorder - upsert of computed scores on the `(user, period)` key.

use std::sync::Arc;

use tracing::debug;

use crate::domain::scoring::{Score, ScoreComputation, ScoreDraft, ScoringError};
use crate::ports::ScoreRepository;

/// Result of writing a score.
#[derive(Debug, Clone)]
pub struct RecordedScore {
    pub score: Score,
    /// True when this write inserted the row.
    pub created: bool,
}

pub struct ScoreRecorder {
    scores: Arc<dyn ScoreRepository>,
}

impl ScoreRecorder {
    pub fn new(scores: Arc<dyn ScoreRepository>) -> Self {
        Self { scores }
    }

    /// Inserts or overwrites the score of the draft's user and period.
    pub async fn upsert(&self, draft: ScoreDraft) -> Result<RecordedScore, ScoringError> {
        let existing = self.scores.find(draft.user_id, draft.period_id).await?;
        self.record(existing, draft).await
    }

    /// Like `upsert`, with the current row already read by the caller.
    ///
    /// An insert that loses a race against a concurrent writer is retried
    /// once as an update. Ranking columns are never written here.
    pub async fn record(
        &self,
        existing: Option<Score>,
        draft: ScoreDraft,
    ) -> Result<RecordedScore, ScoringError> {
        if let Some(score) = existing {
            let score = self.overwrite(score, &draft.computation).await?;
            return Ok(RecordedScore { score, created: false });
        }

        let (user_id, period_id) = (draft.user_id, draft.period_id);
        let computation = draft.computation.clone();

        match self.scores.insert(draft).await {
            Ok(score) => Ok(RecordedScore { score, created: true }),
            Err(e) if e.is_conflict() => {
                debug!(user_id = %user_id, period_id = %period_id, "Score insert conflicted, updating instead");
                let score = self.scores.find(user_id, period_id).await?.ok_or_else(|| {
                    ScoringError::conflict(format!(
                        "score for user {} in period {} conflicted but could not be re-read",
                        user_id, period_id
                    ))
                })?;
                let score = self.overwrite(score, &computation).await?;
                Ok(RecordedScore { score, created: false })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn overwrite(&self, mut score: Score, computation: &ScoreComputation) -> Result<Score, ScoringError> {
        score.apply_computation(computation);
        self.scores.update(&score).await?;
        Ok(score)
    }
}
