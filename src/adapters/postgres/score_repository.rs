//! PostgreSQL implementation of ScoreRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;

use super::{map_write_error, non_negative, read_error, to_i32};
use crate::domain::foundation::{
    DepartmentId, DomainError, ErrorCode, PeriodId, RuleId, ScoreId, Timestamp, UserId,
};
use crate::domain::period::PeriodType;
use crate::domain::scoring::{RankAssignment, RankingScope, RuleBreakdownEntry, Score, ScoreDraft};
use crate::ports::ScoreRepository;

const UNIQUE_KEY: &str = "scores_user_period_key";

const SCORE_COLUMNS: &str = r#"
    id, user_id, period_id, period_type, period_year, period_month, period_quarter, department_id,
    total_score, positive_score, negative_score, adjusted_score,
    total_events, positive_events, negative_events, pending_events,
    rule_breakdown,
    rank_department, rank_company, percentile_department, percentile_company,
    previous_total_score, score_change, score_change_percent,
    computed_at, events_computed_count, computation_version,
    is_locked, has_adjustments, needs_recalculation
"#;

pub struct PostgresScoreRepository {
    pool: PgPool,
}

impl PostgresScoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ScoreRow {
    id: i64,
    user_id: i64,
    period_id: i64,
    period_type: String,
    period_year: i32,
    period_month: Option<i32>,
    period_quarter: Option<i32>,
    department_id: Option<i64>,
    total_score: f64,
    positive_score: f64,
    negative_score: f64,
    adjusted_score: f64,
    total_events: i32,
    positive_events: i32,
    negative_events: i32,
    pending_events: i32,
    rule_breakdown: Json<BTreeMap<RuleId, RuleBreakdownEntry>>,
    rank_department: Option<i32>,
    rank_company: Option<i32>,
    percentile_department: Option<f64>,
    percentile_company: Option<f64>,
    previous_total_score: Option<f64>,
    score_change: Option<f64>,
    score_change_percent: Option<f64>,
    computed_at: DateTime<Utc>,
    events_computed_count: i32,
    computation_version: String,
    is_locked: bool,
    has_adjustments: bool,
    needs_recalculation: bool,
}

impl TryFrom<ScoreRow> for Score {
    type Error = DomainError;

    fn try_from(row: ScoreRow) -> Result<Self, Self::Error> {
        let period_type: PeriodType = row.period_type.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid period type: {}", e))
        })?;

        Ok(Score {
            id: ScoreId::new(row.id),
            user_id: UserId::new(row.user_id),
            period_id: PeriodId::new(row.period_id),
            period_type,
            period_year: row.period_year,
            period_month: row.period_month.map(|m| non_negative(m, "period_month")).transpose()?,
            period_quarter: row
                .period_quarter
                .map(|q| non_negative(q, "period_quarter"))
                .transpose()?,
            department_id: row.department_id.map(DepartmentId::new),
            total_score: row.total_score,
            positive_score: row.positive_score,
            negative_score: row.negative_score,
            adjusted_score: row.adjusted_score,
            total_events: non_negative(row.total_events, "total_events")?,
            positive_events: non_negative(row.positive_events, "positive_events")?,
            negative_events: non_negative(row.negative_events, "negative_events")?,
            pending_events: non_negative(row.pending_events, "pending_events")?,
            rule_breakdown: row.rule_breakdown.0,
            rank_department: row.rank_department.map(|r| non_negative(r, "rank_department")).transpose()?,
            rank_company: row.rank_company.map(|r| non_negative(r, "rank_company")).transpose()?,
            percentile_department: row.percentile_department,
            percentile_company: row.percentile_company,
            previous_total_score: row.previous_total_score,
            score_change: row.score_change,
            score_change_percent: row.score_change_percent,
            computed_at: Timestamp::from_datetime(row.computed_at),
            events_computed_count: non_negative(row.events_computed_count, "events_computed_count")?,
            computation_version: row.computation_version,
            is_locked: row.is_locked,
            has_adjustments: row.has_adjustments,
            needs_recalculation: row.needs_recalculation,
        })
    }
}

#[async_trait]
impl ScoreRepository for PostgresScoreRepository {
    async fn find(&self, user_id: UserId, period_id: PeriodId) -> Result<Option<Score>, DomainError> {
        let row: Option<ScoreRow> = sqlx::query_as(&format!(
            "SELECT {} FROM scores WHERE user_id = $1 AND period_id = $2",
            SCORE_COLUMNS
        ))
        .bind(user_id.value())
        .bind(period_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(read_error("Failed to load score"))?;

        row.map(Score::try_from).transpose()
    }

    async fn insert(&self, draft: ScoreDraft) -> Result<Score, DomainError> {
        // Placeholder id, replaced by the one the database assigns.
        let score = draft.into_score(ScoreId::new(0));

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO scores (
                user_id, period_id, period_type, period_year, period_month, period_quarter,
                department_id,
                total_score, positive_score, negative_score, adjusted_score,
                total_events, positive_events, negative_events, pending_events,
                rule_breakdown,
                previous_total_score, score_change, score_change_percent,
                computed_at, events_computed_count, computation_version,
                is_locked, has_adjustments, needs_recalculation
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            RETURNING id
            "#,
        )
        .bind(score.user_id.value())
        .bind(score.period_id.value())
        .bind(score.period_type.as_str())
        .bind(score.period_year)
        .bind(score.period_month.map(|m| m as i32))
        .bind(score.period_quarter.map(|q| q as i32))
        .bind(score.department_id.map(|d| d.value()))
        .bind(score.total_score)
        .bind(score.positive_score)
        .bind(score.negative_score)
        .bind(score.adjusted_score)
        .bind(to_i32(score.total_events, "total_events")?)
        .bind(to_i32(score.positive_events, "positive_events")?)
        .bind(to_i32(score.negative_events, "negative_events")?)
        .bind(to_i32(score.pending_events, "pending_events")?)
        .bind(Json(&score.rule_breakdown))
        .bind(score.previous_total_score)
        .bind(score.score_change)
        .bind(score.score_change_percent)
        .bind(score.computed_at.as_datetime())
        .bind(to_i32(score.events_computed_count, "events_computed_count")?)
        .bind(&score.computation_version)
        .bind(score.is_locked)
        .bind(score.has_adjustments)
        .bind(score.needs_recalculation)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, UNIQUE_KEY, "Failed to insert score"))?;

        Ok(Score {
            id: ScoreId::new(id),
            ..score
        })
    }

    async fn update(&self, score: &Score) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE scores SET
                total_score = $2,
                positive_score = $3,
                negative_score = $4,
                adjusted_score = $5,
                total_events = $6,
                positive_events = $7,
                negative_events = $8,
                pending_events = $9,
                rule_breakdown = $10,
                previous_total_score = $11,
                score_change = $12,
                score_change_percent = $13,
                computed_at = $14,
                events_computed_count = $15,
                computation_version = $16,
                is_locked = $17,
                has_adjustments = $18,
                needs_recalculation = $19,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(score.id.value())
        .bind(score.total_score)
        .bind(score.positive_score)
        .bind(score.negative_score)
        .bind(score.adjusted_score)
        .bind(to_i32(score.total_events, "total_events")?)
        .bind(to_i32(score.positive_events, "positive_events")?)
        .bind(to_i32(score.negative_events, "negative_events")?)
        .bind(to_i32(score.pending_events, "pending_events")?)
        .bind(Json(&score.rule_breakdown))
        .bind(score.previous_total_score)
        .bind(score.score_change)
        .bind(score.score_change_percent)
        .bind(score.computed_at.as_datetime())
        .bind(to_i32(score.events_computed_count, "events_computed_count")?)
        .bind(&score.computation_version)
        .bind(score.is_locked)
        .bind(score.has_adjustments)
        .bind(score.needs_recalculation)
        .execute(&self.pool)
        .await
        .map_err(read_error("Failed to update score"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ScoreNotFound,
                format!("Score not found: {}", score.id),
            ));
        }
        Ok(())
    }

    async fn list_for_period(
        &self,
        period_id: PeriodId,
        department_id: Option<DepartmentId>,
    ) -> Result<Vec<Score>, DomainError> {
        let rows: Vec<ScoreRow> = sqlx::query_as(&format!(
            "SELECT {} FROM scores WHERE period_id = $1 AND ($2::BIGINT IS NULL OR department_id = $2) ORDER BY user_id",
            SCORE_COLUMNS
        ))
        .bind(period_id.value())
        .bind(department_id.map(|d| d.value()))
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("Failed to list scores"))?;

        rows.into_iter().map(Score::try_from).collect()
    }

    async fn apply_rankings(
        &self,
        period_id: PeriodId,
        scope: RankingScope,
        assignments: &[RankAssignment],
    ) -> Result<(), DomainError> {
        let statement = match scope {
            RankingScope::Department(_) => {
                "UPDATE scores SET rank_department = $3, percentile_department = $4, updated_at = NOW() WHERE id = $1 AND period_id = $2"
            }
            RankingScope::Company => {
                "UPDATE scores SET rank_company = $3, percentile_company = $4, updated_at = NOW() WHERE id = $1 AND period_id = $2"
            }
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(read_error("Failed to begin ranking transaction"))?;

        for assignment in assignments {
            sqlx::query(statement)
                .bind(assignment.score_id.value())
                .bind(period_id.value())
                .bind(to_i32(assignment.rank, "rank")?)
                .bind(assignment.percentile)
                .execute(&mut *tx)
                .await
                .map_err(read_error("Failed to write ranking"))?;
        }

        tx.commit()
            .await
            .map_err(read_error("Failed to commit rankings"))
    }

    async fn mark_needs_recalculation(&self, period_id: PeriodId) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE scores SET needs_recalculation = TRUE, updated_at = NOW() WHERE period_id = $1",
        )
        .bind(period_id.value())
        .execute(&self.pool)
        .await
        .map_err(read_error("Failed to flag scores"))?;

        Ok(result.rows_affected())
    }
}
