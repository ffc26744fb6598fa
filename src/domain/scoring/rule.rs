//! Scoring rules and the resolved rule set handed to the cap applier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::RuleId;

/// Effective date range of the rule pack that owns a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePackWindow {
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

impl RulePackWindow {
    /// True when the pack is in force on `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.map_or(true, |to| to >= date)
    }
}

/// A scoring policy as of the moment it was loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub code: String,
    pub name: String,
    pub base_score: f64,
    pub weight: f64,
    /// Maximum absolute contribution of this rule per user per period.
    pub caps: Option<f64>,
    pub active: bool,
    pub pack: RulePackWindow,
}

impl Rule {
    /// A rule is active for a period iff it is flagged active and its pack
    /// is in force on the period's start date.
    pub fn is_active_for(&self, period_start: NaiveDate) -> bool {
        self.active && self.pack.covers(period_start)
    }

    /// The cap to enforce, if any. A zero or negative cap counts as unset.
    pub fn effective_cap(&self) -> Option<f64> {
        self.caps.filter(|cap| *cap > 0.0)
    }
}

/// Rules active for one period, keyed by id.
///
/// Built once per batch and passed explicitly into aggregation so that the
/// cap applier stays a pure function of its inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: BTreeMap<RuleId, Rule>,
}

impl RuleSet {
    /// Keeps only the rules active for a period starting on `period_start`.
    pub fn active_for(rules: impl IntoIterator<Item = Rule>, period_start: NaiveDate) -> Self {
        Self {
            rules: rules
                .into_iter()
                .filter(|rule| rule.is_active_for(period_start))
                .map(|rule| (rule.id, rule))
                .collect(),
        }
    }

    pub fn get(&self, id: &RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
