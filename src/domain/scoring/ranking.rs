//! Ranking Calculator - orders a population of scores and assigns percentiles.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::Score;
use crate::domain::foundation::{DepartmentId, ScoreId, UserId};

/// Population a ranking is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankingScope {
    Department(DepartmentId),
    Company,
}

impl RankingScope {
    pub fn department(&self) -> Option<DepartmentId> {
        match self {
            RankingScope::Department(id) => Some(*id),
            RankingScope::Company => None,
        }
    }
}

impl fmt::Display for RankingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingScope::Department(id) => write!(f, "department:{}", id),
            RankingScope::Company => f.write_str("company"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankAssignment {
    pub score_id: ScoreId,
    pub user_id: UserId,
    pub rank: u32,
    pub percentile: f64,
}

pub struct RankingCalculator;

impl RankingCalculator {
    /// Sorts by total score descending, breaking ties by user id ascending,
    /// and assigns sequential ranks starting at 1.
    ///
    /// Percentile is `((n - rank + 1) / n) * 100`, so rank 1 is always 100.
    pub fn rank(scores: &[Score]) -> Vec<RankAssignment> {
        let mut ordered: Vec<&Score> = scores.iter().collect();
        ordered.sort_by(|a, b| Self::compare(a, b));

        let n = ordered.len() as f64;
        ordered
            .into_iter()
            .enumerate()
            .map(|(idx, score)| {
                let rank = idx as u32 + 1;
                RankAssignment {
                    score_id: score.id,
                    user_id: score.user_id,
                    rank,
                    percentile: (n - rank as f64 + 1.0) / n * 100.0,
                }
            })
            .collect()
    }

    fn compare(a: &Score, b: &Score) -> Ordering {
        b.total_score
            .total_cmp(&a.total_score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    }
}
