//! Score - the cached aggregate of one user for one period.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::cap_applier::round2;
use super::{RankingScope, RuleBreakdownEntry, ScoreAggregate};
use crate::domain::foundation::{DepartmentId, PeriodId, RuleId, ScoreId, Timestamp, UserId};
use crate::domain::period::{Period, PeriodKey, PeriodType};

/// Comparison against the same user's score for the preceding period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTrend {
    pub previous_total_score: Option<f64>,
    pub score_change: Option<f64>,
    /// Change relative to |previous|, absent when previous is zero.
    pub score_change_percent: Option<f64>,
}

impl ScoreTrend {
    pub fn between(current_total: f64, previous_total: Option<f64>) -> Self {
        let Some(previous) = previous_total else {
            return Self::default();
        };
        let change = current_total - previous;
        let percent = if previous != 0.0 {
            Some(round2(change / previous.abs() * 100.0))
        } else {
            None
        };
        Self {
            previous_total_score: Some(previous),
            score_change: Some(round2(change)),
            score_change_percent: percent,
        }
    }
}

/// Everything a single computation produces for a score row.
///
/// Applying a computation overwrites the numeric fields of a score but never
/// its ranking fields, which belong to the ranking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreComputation {
    pub aggregate: ScoreAggregate,
    pub pending_events: u32,
    pub trend: ScoreTrend,
    pub computed_at: Timestamp,
    pub computation_version: String,
    pub is_locked: bool,
}

/// A score that has been computed but not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDraft {
    pub user_id: UserId,
    pub period_id: PeriodId,
    pub period_key: PeriodKey,
    /// Snapshot of the user's department at first computation.
    pub department_id: Option<DepartmentId>,
    pub computation: ScoreComputation,
}

impl ScoreDraft {
    pub fn new(
        user_id: UserId,
        period: &Period,
        department_id: Option<DepartmentId>,
        computation: ScoreComputation,
    ) -> Self {
        Self {
            user_id,
            period_id: period.id,
            period_key: period.key,
            department_id,
            computation,
        }
    }

    /// Materializes the draft with a store-assigned id.
    pub fn into_score(self, id: ScoreId) -> Score {
        let mut score = Score {
            id,
            user_id: self.user_id,
            period_id: self.period_id,
            period_type: self.period_key.period_type(),
            period_year: self.period_key.year(),
            period_month: self.period_key.month(),
            period_quarter: self.period_key.quarter(),
            department_id: self.department_id,
            total_score: 0.0,
            positive_score: 0.0,
            negative_score: 0.0,
            adjusted_score: 0.0,
            total_events: 0,
            positive_events: 0,
            negative_events: 0,
            pending_events: 0,
            rule_breakdown: BTreeMap::new(),
            rank_department: None,
            rank_company: None,
            percentile_department: None,
            percentile_company: None,
            previous_total_score: None,
            score_change: None,
            score_change_percent: None,
            computed_at: self.computation.computed_at,
            events_computed_count: 0,
            computation_version: String::new(),
            is_locked: false,
            has_adjustments: false,
            needs_recalculation: false,
        };
        score.apply_computation(&self.computation);
        score
    }
}

/// One persisted score per (user, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub id: ScoreId,
    pub user_id: UserId,
    pub period_id: PeriodId,

    pub period_type: PeriodType,
    pub period_year: i32,
    pub period_month: Option<u32>,
    pub period_quarter: Option<u32>,
    pub department_id: Option<DepartmentId>,

    pub total_score: f64,
    pub positive_score: f64,
    pub negative_score: f64,
    pub adjusted_score: f64,

    pub total_events: u32,
    pub positive_events: u32,
    pub negative_events: u32,
    pub pending_events: u32,

    pub rule_breakdown: BTreeMap<RuleId, RuleBreakdownEntry>,

    pub rank_department: Option<u32>,
    pub rank_company: Option<u32>,
    pub percentile_department: Option<f64>,
    pub percentile_company: Option<f64>,

    pub previous_total_score: Option<f64>,
    pub score_change: Option<f64>,
    pub score_change_percent: Option<f64>,

    pub computed_at: Timestamp,
    pub events_computed_count: u32,
    pub computation_version: String,

    pub is_locked: bool,
    pub has_adjustments: bool,
    pub needs_recalculation: bool,
}

impl Score {
    /// Overwrites the computed fields in place and clears the stale flag.
    pub fn apply_computation(&mut self, computation: &ScoreComputation) {
        let agg = &computation.aggregate;
        self.total_score = agg.total_score;
        self.positive_score = agg.positive_score;
        self.negative_score = agg.negative_score;
        self.adjusted_score = agg.adjusted_score;
        self.total_events = agg.total_events;
        self.positive_events = agg.positive_events;
        self.negative_events = agg.negative_events;
        self.pending_events = computation.pending_events;
        self.rule_breakdown = agg.rule_breakdown.clone();
        self.previous_total_score = computation.trend.previous_total_score;
        self.score_change = computation.trend.score_change;
        self.score_change_percent = computation.trend.score_change_percent;
        self.computed_at = computation.computed_at;
        self.events_computed_count = agg.total_events;
        self.computation_version = computation.computation_version.clone();
        self.is_locked = computation.is_locked;
        self.has_adjustments = agg.has_adjustments();
        self.needs_recalculation = false;
    }

    /// Writes a rank and percentile for the given scope.
    pub fn apply_rank(&mut self, scope: RankingScope, rank: u32, percentile: f64) {
        match scope {
            RankingScope::Department(_) => {
                self.rank_department = Some(rank);
                self.percentile_department = Some(percentile);
            }
            RankingScope::Company => {
                self.rank_company = Some(rank);
                self.percentile_company = Some(percentile);
            }
        }
    }

    /// `YYYY-MM`, `YYYY-Qn` or `YYYY`.
    pub fn period_key(&self) -> String {
        if let Some(month) = self.period_month {
            format!("{:04}-{:02}", self.period_year, month)
        } else if let Some(quarter) = self.period_quarter {
            format!("{:04}-Q{}", self.period_year, quarter)
        } else {
            format!("{:04}", self.period_year)
        }
    }

    pub fn grade(&self) -> ScoreGrade {
        ScoreGrade::for_total(self.total_score)
    }

    /// Share of events with a positive score.
    pub fn positive_ratio(&self) -> f64 {
        if self.total_events == 0 {
            return 0.0;
        }
        self.positive_events as f64 / self.total_events as f64
    }

    pub fn is_improvement(&self) -> Option<bool> {
        self.score_change.map(|change| change > 0.0)
    }

    /// Classifies the change against the previous period. Changes within
    /// `threshold` either way count as stable.
    pub fn performance_trend(&self, threshold: f64) -> PerformanceTrend {
        match self.score_change {
            None => PerformanceTrend::New,
            Some(change) if change > threshold => PerformanceTrend::Improving,
            Some(change) if change < -threshold => PerformanceTrend::Declining,
            Some(_) => PerformanceTrend::Stable,
        }
    }
}

/// Letter grade bands over the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreGrade {
    APlus,
    A,
    BPlus,
    B,
    CPlus,
    C,
    D,
}

impl ScoreGrade {
    pub fn for_total(total: f64) -> Self {
        match total {
            t if t >= 90.0 => ScoreGrade::APlus,
            t if t >= 80.0 => ScoreGrade::A,
            t if t >= 70.0 => ScoreGrade::BPlus,
            t if t >= 60.0 => ScoreGrade::B,
            t if t >= 50.0 => ScoreGrade::CPlus,
            t if t >= 40.0 => ScoreGrade::C,
            _ => ScoreGrade::D,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreGrade::APlus => "A+",
            ScoreGrade::A => "A",
            ScoreGrade::BPlus => "B+",
            ScoreGrade::B => "B",
            ScoreGrade::CPlus => "C+",
            ScoreGrade::C => "C",
            ScoreGrade::D => "D",
        }
    }
}

impl fmt::Display for ScoreGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTrend {
    New,
    Improving,
    Declining,
    Stable,
}
