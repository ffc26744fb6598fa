//! Rule source port.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::DomainError;
use crate::domain::scoring::Rule;

#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Rules that are flagged active and whose pack is in force on
    /// `effective_at`.
    ///
    /// Implementations may return extra rules; callers filter again through
    /// `RuleSet::active_for`.
    async fn active_rules(&self, effective_at: NaiveDate) -> Result<Vec<Rule>, DomainError>;
}
