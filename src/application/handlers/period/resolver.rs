//! PeriodResolver - get-or-create for scoring periods.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::period::{Period, PeriodDraft, PeriodKey};
use crate::domain::scoring::ScoringError;
use crate::ports::PeriodRepository;

/// Resolves calendar keys to persisted periods.
///
/// Safe under concurrent first use: the store's unique key decides the
/// winner and the loser re-reads it.
pub struct PeriodResolver {
    periods: Arc<dyn PeriodRepository>,
}

impl PeriodResolver {
    pub fn new(periods: Arc<dyn PeriodRepository>) -> Self {
        Self { periods }
    }

    pub async fn resolve_monthly(&self, year: i32, month: u32) -> Result<Period, ScoringError> {
        self.resolve(PeriodKey::monthly(year, month)?).await
    }

    pub async fn resolve_quarterly(&self, year: i32, quarter: u32) -> Result<Period, ScoringError> {
        self.resolve(PeriodKey::quarterly(year, quarter)?).await
    }

    pub async fn resolve_yearly(&self, year: i32) -> Result<Period, ScoringError> {
        self.resolve(PeriodKey::yearly(year)?).await
    }

    pub async fn resolve(&self, key: PeriodKey) -> Result<Period, ScoringError> {
        if let Some(period) = self.periods.find_by_key(&key).await? {
            return Ok(period);
        }

        match self.periods.insert(PeriodDraft::for_key(key)).await {
            Ok(period) => {
                info!(period = %key, period_id = %period.id, "Created period");
                Ok(period)
            }
            Err(e) if e.is_conflict() => {
                debug!(period = %key, "Lost period creation race, re-reading");
                self.periods.find_by_key(&key).await?.ok_or_else(|| {
                    ScoringError::conflict(format!("period {} conflicted but could not be re-read", key))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Looks a period up without creating it.
    pub async fn find(&self, key: &PeriodKey) -> Result<Option<Period>, ScoringError> {
        Ok(self.periods.find_by_key(key).await?)
    }
}
