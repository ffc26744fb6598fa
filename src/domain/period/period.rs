//! Period entity - a persisted scoring window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{PeriodKey, PeriodType};
use crate::domain::foundation::{PeriodId, Timestamp, UserId};

/// Calendar-derived fields of a period that does not exist in storage yet.
///
/// Stores turn a draft into a [`Period`] by assigning an id under the
/// (type, year, month, quarter) uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodDraft {
    pub key: PeriodKey,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub name: String,
}

impl PeriodDraft {
    pub fn for_key(key: PeriodKey) -> Self {
        Self {
            key,
            start_date: key.start_date(),
            end_date: key.end_date(),
            name: key.display_name(),
        }
    }

    /// Materializes the draft with a store-assigned id.
    pub fn into_period(self, id: PeriodId) -> Period {
        Period {
            id,
            key: self.key,
            start_date: self.start_date,
            end_date: self.end_date,
            is_locked: false,
            locked_by: None,
            locked_at: None,
            name: self.name,
        }
    }
}

/// A scoring window. Created lazily on first reference, mutated only to
/// change its lock state, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub key: PeriodKey,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_locked: bool,
    pub locked_by: Option<UserId>,
    pub locked_at: Option<Timestamp>,
    pub name: String,
}

impl Period {
    pub fn period_type(&self) -> PeriodType {
        self.key.period_type()
    }

    pub fn year(&self) -> i32 {
        self.key.year()
    }

    pub fn month(&self) -> Option<u32> {
        self.key.month()
    }

    pub fn quarter(&self) -> Option<u32> {
        self.key.quarter()
    }

    /// True when `date` lies inside `[start_date, end_date]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Locks the period. Returns `false` if it was already locked.
    pub fn lock(&mut self, actor: UserId, at: Timestamp) -> bool {
        if self.is_locked {
            return false;
        }
        self.is_locked = true;
        self.locked_by = Some(actor);
        self.locked_at = Some(at);
        true
    }

    /// Unlocks the period. Returns `false` if it was not locked.
    pub fn unlock(&mut self) -> bool {
        if !self.is_locked {
            return false;
        }
        self.is_locked = false;
        self.locked_by = None;
        self.locked_at = None;
        true
    }
}
