//! Performance events as the engine sees them (read-only snapshots).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{PerformanceEventId, RuleId, UserId, ValidationError};

/// Review workflow state of an event. Only `Approved` events are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Archived,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
            EventStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(EventStatus::Draft),
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "rejected" => Ok(EventStatus::Rejected),
            "archived" => Ok(EventStatus::Archived),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown event status '{}'", other),
            )),
        }
    }
}

/// A single scored occurrence.
///
/// `final_score` is fixed when the event is created or approved (the rule's
/// `base_score * weight`, or the manager's override). The engine sums it as-is
/// and never re-derives it from the live rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEvent {
    pub id: PerformanceEventId,
    pub user_id: UserId,
    pub rule_id: RuleId,
    pub occurred_at: NaiveDate,
    pub status: EventStatus,
    pub original_score: f64,
    pub adjusted_score: Option<f64>,
    pub final_score: f64,
}

impl PerformanceEvent {
    pub fn is_approved(&self) -> bool {
        self.status == EventStatus::Approved
    }

    /// True when a manager override differs from the rule-derived score.
    pub fn is_adjusted(&self) -> bool {
        matches!(self.adjusted_score, Some(adjusted) if adjusted != self.original_score)
    }

    /// `adjusted - original` for adjusted events, `None` otherwise.
    pub fn adjustment_delta(&self) -> Option<f64> {
        if self.is_adjusted() {
            self.adjusted_score.map(|adjusted| adjusted - self.original_score)
        } else {
            None
        }
    }
}
