//! PostgreSQL implementation of PeriodRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use super::{map_write_error, non_negative, read_error};
use crate::domain::foundation::{DomainError, ErrorCode, PeriodId, Timestamp, UserId};
use crate::domain::period::{Period, PeriodDraft, PeriodKey, PeriodType};
use crate::ports::PeriodRepository;

const UNIQUE_KEY: &str = "periods_type_year_month_quarter_key";

pub struct PostgresPeriodRepository {
    pool: PgPool,
}

impl PostgresPeriodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PeriodRow {
    id: i64,
    period_type: String,
    year: i32,
    month: Option<i32>,
    quarter: Option<i32>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    name: String,
    is_locked: bool,
    locked_by: Option<i64>,
    locked_at: Option<DateTime<Utc>>,
}

impl TryFrom<PeriodRow> for Period {
    type Error = DomainError;

    fn try_from(row: PeriodRow) -> Result<Self, Self::Error> {
        let period_type: PeriodType = row.period_type.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid period type: {}", e))
        })?;
        let month = row.month.map(|m| non_negative(m, "month")).transpose()?;
        let quarter = row.quarter.map(|q| non_negative(q, "quarter")).transpose()?;
        let key = PeriodKey::from_parts(period_type, row.year, month, quarter).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored period: {}", e))
        })?;

        Ok(Period {
            id: PeriodId::new(row.id),
            key,
            start_date: row.start_date,
            end_date: row.end_date,
            is_locked: row.is_locked,
            locked_by: row.locked_by.map(UserId::new),
            locked_at: row.locked_at.map(Timestamp::from_datetime),
            name: row.name,
        })
    }
}

fn key_columns(key: &PeriodKey) -> (&'static str, i32, Option<i32>, Option<i32>) {
    (
        key.period_type().as_str(),
        key.year(),
        key.month().map(|m| m as i32),
        key.quarter().map(|q| q as i32),
    )
}

#[async_trait]
impl PeriodRepository for PostgresPeriodRepository {
    async fn find_by_key(&self, key: &PeriodKey) -> Result<Option<Period>, DomainError> {
        let (period_type, year, month, quarter) = key_columns(key);
        let row: Option<PeriodRow> = sqlx::query_as(
            r#"
            SELECT id, period_type, year, month, quarter, start_date, end_date, name,
                   is_locked, locked_by, locked_at
            FROM periods
            WHERE period_type = $1
              AND year = $2
              AND month IS NOT DISTINCT FROM $3
              AND quarter IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(period_type)
        .bind(year)
        .bind(month)
        .bind(quarter)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error("Failed to load period"))?;

        row.map(Period::try_from).transpose()
    }

    async fn insert(&self, draft: PeriodDraft) -> Result<Period, DomainError> {
        let (period_type, year, month, quarter) = key_columns(&draft.key);
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO periods (period_type, year, month, quarter, start_date, end_date, name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(period_type)
        .bind(year)
        .bind(month)
        .bind(quarter)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(&draft.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, UNIQUE_KEY, "Failed to insert period"))?;

        Ok(draft.into_period(PeriodId::new(id)))
    }

    async fn update_lock(
        &self,
        id: PeriodId,
        locked: bool,
        locked_by: Option<UserId>,
        locked_at: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        let (locked_by, locked_at) = if locked {
            (locked_by.map(|u| u.value()), locked_at.map(|t| *t.as_datetime()))
        } else {
            (None, None)
        };

        let result = sqlx::query(
            r#"
            UPDATE periods
            SET is_locked = $2, locked_by = $3, locked_at = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .bind(locked)
        .bind(locked_by)
        .bind(locked_at)
        .execute(&self.pool)
        .await
        .map_err(read_error("Failed to update period lock"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PeriodNotFound,
                format!("Period not found: {}", id),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(period_type: &str, month: Option<i32>, quarter: Option<i32>) -> PeriodRow {
        PeriodRow {
            id: 1,
            period_type: period_type.to_string(),
            year: 2024,
            month,
            quarter,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            name: "Q1 2024".to_string(),
            is_locked: false,
            locked_by: None,
            locked_at: None,
        }
    }

    #[test]
    fn quarterly_row_maps_to_quarter_key() {
        let period = Period::try_from(row("quarterly", None, Some(1))).unwrap();
        assert_eq!(period.key, PeriodKey::quarterly(2024, 1).unwrap());
    }

    #[test]
    fn inconsistent_row_is_rejected() {
        let err = Period::try_from(row("monthly", None, Some(1))).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn key_columns_leave_unused_parts_null() {
        let (ty, year, month, quarter) = key_columns(&PeriodKey::yearly(2023).unwrap());
        assert_eq!(ty, "yearly");
        assert_eq!(year, 2023);
        assert_eq!(month, None);
        assert_eq!(quarter, None);
    }
}
