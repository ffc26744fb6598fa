//! Performance event source port (read side).
//!
//! The engine never writes events. It reads approved events for one user in
//! a date window and counts the ones still waiting for review.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::scoring::PerformanceEvent;

#[async_trait]
pub trait PerformanceEventSource: Send + Sync {
    /// Approved events of `user_id` with `start <= occurred_at <= end`,
    /// ordered by event id.
    async fn approved_events(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PerformanceEvent>, DomainError>;

    /// Number of pending events of `user_id` in the same window.
    async fn count_pending(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u32, DomainError>;
}
