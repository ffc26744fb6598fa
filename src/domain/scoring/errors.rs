//! Scoring-specific error types.
//!
//! | Error | Code |
//! |-------|------|
//! | UserNotFound | USER_NOT_FOUND |
//! | InvalidPeriod | INVALID_PERIOD |
//! | PeriodLocked | PERIOD_LOCKED |
//! | ConcurrencyConflict | CONCURRENCY_CONFLICT |
//! | Infrastructure | DATABASE_ERROR |

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, UserId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Invalid period: {0}")]
    InvalidPeriod(#[from] ValidationError),

    #[error("Period {0} is locked")]
    PeriodLocked(String),

    #[error("Concurrent update conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl ScoringError {
    pub fn period_locked(period_key: impl Into<String>) -> Self {
        ScoringError::PeriodLocked(period_key.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ScoringError::ConcurrencyConflict(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        ScoringError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ScoringError::UserNotFound(_) => ErrorCode::UserNotFound,
            ScoringError::InvalidPeriod(_) => ErrorCode::InvalidPeriod,
            ScoringError::PeriodLocked(_) => ErrorCode::PeriodLocked,
            ScoringError::ConcurrencyConflict(_) => ErrorCode::ConcurrencyConflict,
            ScoringError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// True for failures a caller may retry without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScoringError::ConcurrencyConflict(_) | ScoringError::Infrastructure(_)
        )
    }
}

impl From<DomainError> for ScoringError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ConcurrencyConflict => ScoringError::ConcurrencyConflict(err.message),
            ErrorCode::ValidationFailed | ErrorCode::InvalidPeriod => {
                let field = err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "period".to_string());
                ScoringError::InvalidPeriod(ValidationError::invalid_format(field, err.message))
            }
            ErrorCode::PeriodLocked => ScoringError::PeriodLocked(err.message),
            _ => ScoringError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ScoringError> for DomainError {
    fn from(err: ScoringError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
