//! PostgreSQL read-side adapters.
//!
//! These tables belong to the event, rule and user services. The engine only
//! reads them.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use super::read_error;
use crate::domain::foundation::{
    DepartmentId, DomainError, ErrorCode, PerformanceEventId, RuleId, UserId,
};
use crate::domain::scoring::{EventStatus, PerformanceEvent, Rule, RulePackWindow};
use crate::ports::{Employee, EmployeeDirectory, PerformanceEventSource, RuleSource};

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    user_id: i64,
    rule_id: i64,
    occurred_at: NaiveDate,
    status: String,
    original_score: f64,
    adjusted_score: Option<f64>,
    final_score: f64,
}

impl TryFrom<EventRow> for PerformanceEvent {
    type Error = DomainError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status: EventStatus = row.status.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid event status: {}", e))
        })?;
        Ok(PerformanceEvent {
            id: PerformanceEventId::new(row.id),
            user_id: UserId::new(row.user_id),
            rule_id: RuleId::new(row.rule_id),
            occurred_at: row.occurred_at,
            status,
            original_score: row.original_score,
            adjusted_score: row.adjusted_score,
            final_score: row.final_score,
        })
    }
}

pub struct PostgresEventSource {
    pool: PgPool,
}

impl PostgresEventSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PerformanceEventSource for PostgresEventSource {
    async fn approved_events(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PerformanceEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id::BIGINT AS id, user_id::BIGINT AS user_id, rule_id::BIGINT AS rule_id,
                   occurred_at, status::TEXT AS status,
                   original_score, adjusted_score, final_score
            FROM events
            WHERE user_id = $1
              AND status::TEXT = 'approved'
              AND occurred_at BETWEEN $2 AND $3
            ORDER BY id
            "#,
        )
        .bind(user_id.value())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("Failed to load approved events"))?;

        rows.into_iter().map(PerformanceEvent::try_from).collect()
    }

    async fn count_pending(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u32, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM events
            WHERE user_id = $1
              AND status::TEXT = 'pending'
              AND occurred_at BETWEEN $2 AND $3
            "#,
        )
        .bind(user_id.value())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(read_error("Failed to count pending events"))?;

        Ok(count.max(0) as u32)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RuleRow {
    id: i64,
    code: String,
    name: String,
    base_score: f64,
    weight: f64,
    caps: Option<f64>,
    active: bool,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
}

impl From<RuleRow> for Rule {
    fn from(row: RuleRow) -> Self {
        Rule {
            id: RuleId::new(row.id),
            code: row.code,
            name: row.name,
            base_score: row.base_score,
            weight: row.weight,
            caps: row.caps,
            active: row.active,
            pack: RulePackWindow {
                effective_from: row.effective_from,
                effective_to: row.effective_to,
            },
        }
    }
}

pub struct PostgresRuleSource {
    pool: PgPool,
}

impl PostgresRuleSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleSource for PostgresRuleSource {
    async fn active_rules(&self, effective_at: NaiveDate) -> Result<Vec<Rule>, DomainError> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            r#"
            SELECT r.id::BIGINT AS id, r.code, r.name, r.base_score, r.weight, r.caps, r.active,
                   p.effective_from, p.effective_to
            FROM rules r
            JOIN rule_packs p ON p.id = r.rule_pack_id
            WHERE r.active = TRUE
              AND p.status::TEXT = 'active'
              AND p.effective_from <= $1
              AND (p.effective_to IS NULL OR p.effective_to >= $1)
            ORDER BY r.id
            "#,
        )
        .bind(effective_at)
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("Failed to load active rules"))?;

        Ok(rows.into_iter().map(Rule::from).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EmployeeRow {
    id: i64,
    department_id: Option<i64>,
    active: bool,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: UserId::new(row.id),
            department_id: row.department_id.map(DepartmentId::new),
            active: row.active,
        }
    }
}

pub struct PostgresEmployeeDirectory {
    pool: PgPool,
}

impl PostgresEmployeeDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const EMPLOYEE_COLUMNS: &str =
    "id::BIGINT AS id, department_id::BIGINT AS department_id, (status::TEXT = 'active') AS active";

#[async_trait]
impl EmployeeDirectory for PostgresEmployeeDirectory {
    async fn find_employee(&self, user_id: UserId) -> Result<Option<Employee>, DomainError> {
        let row: Option<EmployeeRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", EMPLOYEE_COLUMNS))
                .bind(user_id.value())
                .fetch_optional(&self.pool)
                .await
                .map_err(read_error("Failed to load user"))?;

        Ok(row.map(Employee::from))
    }

    async fn active_in_department(
        &self,
        department_id: DepartmentId,
    ) -> Result<Vec<Employee>, DomainError> {
        let rows: Vec<EmployeeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE department_id = $1 AND status::TEXT = 'active' ORDER BY id",
            EMPLOYEE_COLUMNS
        ))
        .bind(department_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("Failed to load department members"))?;

        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn all_active(&self) -> Result<Vec<Employee>, DomainError> {
        let rows: Vec<EmployeeRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE status::TEXT = 'active' ORDER BY id",
            EMPLOYEE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("Failed to load active users"))?;

        Ok(rows.into_iter().map(Employee::from).collect())
    }
}
