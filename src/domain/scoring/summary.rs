//! Batch outcomes and department roll-ups.

use serde::{Deserialize, Serialize};

use super::cap_applier::round2;
use super::Score;
use crate::domain::foundation::{DepartmentId, UserId};
use crate::domain::period::PeriodKey;

/// A per-user failure inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    pub user_id: UserId,
    pub message: String,
}

/// Outcome of computing scores for a population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub period: PeriodKey,
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    pub errors: Vec<BatchError>,
}

impl BatchSummary {
    pub fn new(period: PeriodKey) -> Self {
        Self {
            period,
            total: 0,
            successful: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.total += 1;
        self.successful += 1;
    }

    pub fn record_failure(&mut self, user_id: UserId, message: impl Into<String>) {
        self.total += 1;
        self.failed += 1;
        self.errors.push(BatchError {
            user_id,
            message: message.into(),
        });
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub user_id: UserId,
    pub total_score: f64,
    pub grade: String,
}

/// Aggregate view of one department's scores for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub department_id: DepartmentId,
    pub period: PeriodKey,
    pub employee_count: u32,
    pub average_score: f64,
    pub max_score: f64,
    pub min_score: f64,
    pub total_events: u32,
    pub total_positive_events: u32,
    pub total_negative_events: u32,
    pub top_performer: Option<TopPerformer>,
}

impl DepartmentSummary {
    /// Rolls up `scores`. The top performer is the highest total, ties going
    /// to the lower user id as in ranking.
    pub fn from_scores(department_id: DepartmentId, period: PeriodKey, scores: &[Score]) -> Self {
        if scores.is_empty() {
            return Self {
                department_id,
                period,
                employee_count: 0,
                average_score: 0.0,
                max_score: 0.0,
                min_score: 0.0,
                total_events: 0,
                total_positive_events: 0,
                total_negative_events: 0,
                top_performer: None,
            };
        }

        let sum: f64 = scores.iter().map(|s| s.total_score).sum();
        let max = scores.iter().map(|s| s.total_score).fold(f64::MIN, f64::max);
        let min = scores.iter().map(|s| s.total_score).fold(f64::MAX, f64::min);

        let top = scores
            .iter()
            .min_by(|a, b| {
                b.total_score
                    .total_cmp(&a.total_score)
                    .then_with(|| a.user_id.cmp(&b.user_id))
            })
            .map(|s| TopPerformer {
                user_id: s.user_id,
                total_score: s.total_score,
                grade: s.grade().to_string(),
            });

        Self {
            department_id,
            period,
            employee_count: scores.len() as u32,
            average_score: round2(sum / scores.len() as f64),
            max_score: max,
            min_score: min,
            total_events: scores.iter().map(|s| s.total_events).sum(),
            total_positive_events: scores.iter().map(|s| s.positive_events).sum(),
            total_negative_events: scores.iter().map(|s| s.negative_events).sum(),
            top_performer: top,
        }
    }
}
