//! Period repository port.
//!
//! # Uniqueness
//!
//! Implementations must enforce at most one period per
//! `(period_type, year, month, quarter)`. A losing concurrent insert fails
//! with `ConcurrencyConflict`, after which the caller re-reads the winner.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PeriodId, Timestamp, UserId};
use crate::domain::period::{Period, PeriodDraft, PeriodKey};

#[async_trait]
pub trait PeriodRepository: Send + Sync {
    async fn find_by_key(&self, key: &PeriodKey) -> Result<Option<Period>, DomainError>;

    /// Inserts a new period and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict` if a period with the same key already exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, draft: PeriodDraft) -> Result<Period, DomainError>;

    /// Sets or clears the lock. `locked_by`/`locked_at` are cleared on unlock.
    ///
    /// # Errors
    ///
    /// - `PeriodNotFound` if the period does not exist
    async fn update_lock(
        &self,
        id: PeriodId,
        locked: bool,
        locked_by: Option<UserId>,
        locked_at: Option<Timestamp>,
    ) -> Result<(), DomainError>;
}
