//! In-memory period repository.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, PeriodId, Timestamp, UserId};
use crate::domain::period::{Period, PeriodDraft, PeriodKey};
use crate::ports::PeriodRepository;

#[derive(Default)]
struct State {
    next_id: i64,
    by_key: HashMap<PeriodKey, Period>,
}

/// Periods keyed by `PeriodKey`. The key map gives the same uniqueness
/// guarantee as the database constraint.
#[derive(Default)]
pub struct InMemoryPeriodRepository {
    state: RwLock<State>,
}

impl InMemoryPeriodRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.by_key.len()
    }
}

#[async_trait]
impl PeriodRepository for InMemoryPeriodRepository {
    async fn find_by_key(&self, key: &PeriodKey) -> Result<Option<Period>, DomainError> {
        Ok(self.state.read().await.by_key.get(key).cloned())
    }

    async fn insert(&self, draft: PeriodDraft) -> Result<Period, DomainError> {
        let mut state = self.state.write().await;
        if state.by_key.contains_key(&draft.key) {
            return Err(DomainError::conflict(format!("period {} already exists", draft.key))
                .with_detail("constraint", "periods_type_year_month_quarter_key"));
        }
        state.next_id += 1;
        let period = draft.into_period(PeriodId::new(state.next_id));
        state.by_key.insert(period.key, period.clone());
        Ok(period)
    }

    async fn update_lock(
        &self,
        id: PeriodId,
        locked: bool,
        locked_by: Option<UserId>,
        locked_at: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let period = state
            .by_key
            .values_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::PeriodNotFound, format!("period {} not found", id)))?;

        period.is_locked = locked;
        if locked {
            period.locked_by = locked_by;
            period.locked_at = locked_at;
        } else {
            period.locked_by = None;
            period.locked_at = None;
        }
        Ok(())
    }
}
