//! PeriodLockHandler - lock, unlock and stale-marking of periods.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::handlers::audit::{emit, AuditContext};
use crate::domain::foundation::{EventId, Timestamp, UserId};
use crate::domain::period::{Period, PeriodKey};
use crate::domain::scoring::{PeriodLockChanged, ScoringError};
use crate::ports::{AuditSink, PeriodRepository, ScoreRepository};

use super::PeriodResolver;

pub struct PeriodLockHandler {
    periods: Arc<dyn PeriodRepository>,
    scores: Arc<dyn ScoreRepository>,
    audit: Arc<dyn AuditSink>,
    resolver: PeriodResolver,
}

impl PeriodLockHandler {
    pub fn new(
        periods: Arc<dyn PeriodRepository>,
        scores: Arc<dyn ScoreRepository>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            resolver: PeriodResolver::new(periods.clone()),
            periods,
            scores,
            audit,
        }
    }

    /// Locks the period, creating it first if needed. Locking an already
    /// locked period keeps the original actor and time.
    pub async fn lock_period(&self, key: PeriodKey, actor: UserId) -> Result<Period, ScoringError> {
        let mut period = self.resolver.resolve(key).await?;
        let now = Timestamp::now();

        if !period.lock(actor, now) {
            debug!(period = %key, "Period already locked");
            return Ok(period);
        }

        self.periods
            .update_lock(period.id, true, Some(actor), Some(now))
            .await?;
        info!(period = %key, actor = %actor, "Period locked");

        self.emit_change(&period, Some(actor), AuditContext::user(actor)).await;
        Ok(period)
    }

    pub async fn unlock_period(&self, key: PeriodKey, actor: UserId) -> Result<Period, ScoringError> {
        let mut period = self.resolver.resolve(key).await?;

        if !period.unlock() {
            debug!(period = %key, "Period already unlocked");
            return Ok(period);
        }

        self.periods.update_lock(period.id, false, None, None).await?;
        info!(period = %key, actor = %actor, "Period unlocked");

        self.emit_change(&period, Some(actor), AuditContext::user(actor)).await;
        Ok(period)
    }

    /// Flags every score of the period for recomputation. Returns how many
    /// scores were flagged; an unknown period has none.
    pub async fn mark_period_stale(&self, key: PeriodKey) -> Result<u64, ScoringError> {
        let Some(period) = self.resolver.find(&key).await? else {
            debug!(period = %key, "No such period, nothing to mark");
            return Ok(0);
        };

        let flagged = self.scores.mark_needs_recalculation(period.id).await?;
        info!(period = %key, flagged, "Marked scores for recalculation");
        Ok(flagged)
    }

    async fn emit_change(&self, period: &Period, actor: Option<UserId>, ctx: AuditContext) {
        let event = PeriodLockChanged {
            event_id: EventId::new(),
            period_id: period.id,
            period_key: period.key.to_string(),
            locked: period.is_locked,
            actor,
            changed_at: Timestamp::now(),
        };
        emit(self.audit.as_ref(), &event, &ctx).await;
    }
}
