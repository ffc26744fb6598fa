//! ScoringOrchestrator - single-user and batch score computation.
//!
//! A computation reads approved events, applies per-rule caps, computes the
//! trend against the previous period and writes the score. Batches fan out
//! per user with bounded concurrency, then rank once every score of the
//! population is written.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::application::handlers::audit::{emit, AuditContext};
use crate::application::handlers::period::PeriodResolver;
use crate::config::{LockedPeriodPolicy, ScoringConfig};
use crate::domain::foundation::{DepartmentId, EventId, Timestamp, UserId};
use crate::domain::period::{Period, PeriodKey};
use crate::domain::scoring::{
    BatchSummary, EventAggregator, PeriodRecalculated, RankAssignment, RankingScope,
    RuleCapApplier, RuleSet, Score, ScoreComputation, ScoreComputed, ScoreDraft, ScoreTrend,
    ScoresBatchComputed, ScoringError,
};
use crate::ports::{
    AuditSink, Employee, EmployeeDirectory, PerformanceEventSource, PeriodRepository, RuleSource,
    ScoreRepository,
};

use super::{RankingService, ScoreRecorder};

/// Every port the engine talks to.
#[derive(Clone)]
pub struct ScoringPorts {
    pub events: Arc<dyn PerformanceEventSource>,
    pub rules: Arc<dyn RuleSource>,
    pub directory: Arc<dyn EmployeeDirectory>,
    pub periods: Arc<dyn PeriodRepository>,
    pub scores: Arc<dyn ScoreRepository>,
    pub audit: Arc<dyn AuditSink>,
}

/// Scores of a batch plus the per-user outcome counts.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Successfully computed scores, ordered by user id, with the ranks of
    /// the batch's scope applied.
    pub scores: Vec<Score>,
    pub summary: BatchSummary,
}

pub struct ScoringOrchestrator {
    ports: ScoringPorts,
    config: ScoringConfig,
    resolver: PeriodResolver,
    recorder: ScoreRecorder,
    ranking: RankingService,
}

impl ScoringOrchestrator {
    pub fn new(ports: ScoringPorts, config: ScoringConfig) -> Self {
        Self {
            resolver: PeriodResolver::new(ports.periods.clone()),
            recorder: ScoreRecorder::new(ports.scores.clone()),
            ranking: RankingService::new(ports.scores.clone(), ports.audit.clone()),
            ports,
            config,
        }
    }

    /// Monthly score of one user. Returns the stored score unchanged unless
    /// `force` is set or the score was marked for recalculation.
    pub async fn compute_user(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
        force: bool,
    ) -> Result<Score, ScoringError> {
        self.compute_for(user_id, PeriodKey::monthly(year, month)?, force)
            .await
    }

    /// Score of one user for any period granularity.
    pub async fn compute_for(
        &self,
        user_id: UserId,
        key: PeriodKey,
        force: bool,
    ) -> Result<Score, ScoringError> {
        let employee = self
            .ports
            .directory
            .find_employee(user_id)
            .await?
            .ok_or(ScoringError::UserNotFound(user_id))?;
        let period = self.resolver.resolve(key).await?;

        self.compute_with(employee, &period, None, force, &AuditContext::system())
            .await
    }

    /// Computes every active member of a department and ranks the department.
    pub async fn compute_department(
        &self,
        department_id: DepartmentId,
        year: i32,
        month: u32,
        force: bool,
    ) -> Result<BatchOutcome, ScoringError> {
        let started = Timestamp::now();
        let period = self.resolver.resolve_monthly(year, month).await?;
        let employees = self
            .ports
            .directory
            .active_in_department(department_id)
            .await?;

        let scope = RankingScope::Department(department_id);
        self.compute_and_rank(employees, &period, scope, force, started)
            .await
    }

    /// Computes every active user and ranks company-wide.
    pub async fn compute_company(
        &self,
        year: i32,
        month: u32,
        force: bool,
    ) -> Result<BatchOutcome, ScoringError> {
        let started = Timestamp::now();
        let period = self.resolver.resolve_monthly(year, month).await?;
        let employees = self.ports.directory.all_active().await?;

        self.compute_and_rank(employees, &period, RankingScope::Company, force, started)
            .await
    }

    /// Forced recomputation of a month, for one department or everyone.
    ///
    /// Ranks the department when one is given, the company otherwise.
    pub async fn recalculate_period(
        &self,
        year: i32,
        month: u32,
        department_id: Option<DepartmentId>,
    ) -> Result<BatchSummary, ScoringError> {
        let started = Timestamp::now();
        let period = self.resolver.resolve_monthly(year, month).await?;
        let employees = match department_id {
            Some(dept) => self.ports.directory.active_in_department(dept).await?,
            None => self.ports.directory.all_active().await?,
        };
        let ctx = AuditContext::system().for_batch();

        info!(period = %period.key, users = employees.len(), "Recalculating period");
        let outcome = self.compute_population(employees, &period, true, &ctx).await?;

        let scope = department_id.map_or(RankingScope::Company, RankingScope::Department);
        self.ranking.rank(&period, scope, &ctx).await?;

        let finished = Timestamp::now();
        let summary = outcome.summary;
        let event = PeriodRecalculated {
            event_id: EventId::new(),
            period_id: period.id,
            period_key: period.key.to_string(),
            total: summary.total,
            successful: summary.successful,
            failed: summary.failed,
            duration_ms: finished.millis_since(&started),
            completed_at: finished,
        };
        emit(self.ports.audit.as_ref(), &event, &ctx).await;

        info!(
            period = %period.key,
            total = summary.total,
            failed = summary.failed,
            duration_ms = event.duration_ms,
            "Period recalculated"
        );
        Ok(summary)
    }

    async fn compute_and_rank(
        &self,
        employees: Vec<Employee>,
        period: &Period,
        scope: RankingScope,
        force: bool,
        started: Timestamp,
    ) -> Result<BatchOutcome, ScoringError> {
        let ctx = AuditContext::system().for_batch();

        let mut outcome = self.compute_population(employees, period, force, &ctx).await?;
        let assignments = self.ranking.rank(period, scope, &ctx).await?;
        apply_assignments(&mut outcome.scores, scope, &assignments);

        let finished = Timestamp::now();
        let summary = &outcome.summary;
        let event = ScoresBatchComputed {
            event_id: EventId::new(),
            period_id: period.id,
            period_key: period.key.to_string(),
            scope,
            forced: force,
            total: summary.total,
            successful: summary.successful,
            failed: summary.failed,
            duration_ms: finished.millis_since(&started),
            completed_at: finished,
        };
        emit(self.ports.audit.as_ref(), &event, &ctx).await;

        info!(
            period = %period.key,
            scope = %scope,
            successful = summary.successful,
            failed = summary.failed,
            duration_ms = event.duration_ms,
            "Batch scores computed"
        );
        Ok(outcome)
    }

    async fn load_rules(&self, period: &Period) -> Result<RuleSet, ScoringError> {
        let rules = self.ports.rules.active_rules(period.start_date).await?;
        let rules = RuleSet::active_for(rules, period.start_date);
        debug!(period = %period.key, rules = rules.len(), "Loaded active rules");
        Ok(rules)
    }

    async fn compute_population(
        &self,
        employees: Vec<Employee>,
        period: &Period,
        force: bool,
        ctx: &AuditContext,
    ) -> Result<BatchOutcome, ScoringError> {
        if force && period.is_locked && self.config.locked_period_policy == LockedPeriodPolicy::Reject {
            error!(period = %period.key, "Refusing forced batch on locked period");
            return Err(ScoringError::period_locked(period.key.to_string()));
        }

        let rules = self.load_rules(period).await?;
        let concurrency = self.config.max_concurrency.max(1);

        let mut results: Vec<(UserId, Result<Score, ScoringError>)> = stream::iter(employees)
            .map(|employee| {
                let rules = &rules;
                async move {
                    let result = self.compute_with(employee, period, Some(rules), force, ctx).await;
                    (employee.id, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        results.sort_by_key(|(user_id, _)| *user_id);

        let mut summary = BatchSummary::new(period.key);
        let mut scores = Vec::with_capacity(results.len());
        for (user_id, result) in results {
            match result {
                Ok(score) => {
                    summary.record_success();
                    scores.push(score);
                }
                Err(e) => {
                    warn!(user_id = %user_id, period = %period.key, error = %e, "Score computation failed");
                    summary.record_failure(user_id, e.to_string());
                }
            }
        }

        Ok(BatchOutcome { scores, summary })
    }

    /// Rules are loaded on demand when the caller has none at hand, so a
    /// cache hit never touches the rule source.
    async fn compute_with(
        &self,
        employee: Employee,
        period: &Period,
        rules: Option<&RuleSet>,
        force: bool,
        ctx: &AuditContext,
    ) -> Result<Score, ScoringError> {
        let existing = self.ports.scores.find(employee.id, period.id).await?;
        if let Some(score) = &existing {
            if !force && !score.needs_recalculation {
                debug!(user_id = %employee.id, period = %period.key, "Returning cached score");
                let mut cached = score.clone();
                cached.is_locked = period.is_locked;
                return Ok(cached);
            }
        }

        if period.is_locked && self.config.locked_period_policy == LockedPeriodPolicy::Reject {
            return Err(ScoringError::period_locked(period.key.to_string()));
        }

        let started = Timestamp::now();
        let loaded;
        let rules = match rules {
            Some(rules) => rules,
            None => {
                loaded = self.load_rules(period).await?;
                &loaded
            }
        };

        let (start, end) = (period.start_date, period.end_date);
        let events = self
            .ports
            .events
            .approved_events(employee.id, start, end)
            .await?;
        let pending_events = self.ports.events.count_pending(employee.id, start, end).await?;

        let grouped = EventAggregator::group_by_rule(employee.id, start, end, events);
        let aggregate = RuleCapApplier::apply(&grouped, rules);
        let previous_total = self.previous_total(employee.id, &period.key).await?;
        let trend = ScoreTrend::between(aggregate.total_score, previous_total);

        let computation = ScoreComputation {
            aggregate,
            pending_events,
            trend,
            computed_at: Timestamp::now(),
            computation_version: self.config.computation_version.clone(),
            is_locked: period.is_locked,
        };
        let draft = ScoreDraft::new(employee.id, period, employee.department_id, computation);
        let recorded = self.recorder.record(existing, draft).await?;
        let duration_ms = Timestamp::now().millis_since(&started);
        let score = recorded.score;

        debug!(
            user_id = %employee.id,
            period = %period.key,
            total = score.total_score,
            events = score.total_events,
            created = recorded.created,
            duration_ms,
            "Score computed"
        );

        let event = ScoreComputed {
            event_id: EventId::new(),
            score_id: score.id,
            user_id: score.user_id,
            period_id: score.period_id,
            period_key: period.key.to_string(),
            total_score: score.total_score,
            previous_total_score: score.previous_total_score,
            trend: score.performance_trend(self.config.trend_threshold),
            total_events: score.total_events,
            positive_events: score.positive_events,
            negative_events: score.negative_events,
            created: recorded.created,
            duration_ms,
            computed_at: score.computed_at,
        };
        emit(self.ports.audit.as_ref(), &event, ctx).await;

        Ok(score)
    }

    /// Total of the same user in the preceding period of the same
    /// granularity. Never creates the previous period.
    async fn previous_total(
        &self,
        user_id: UserId,
        key: &PeriodKey,
    ) -> Result<Option<f64>, ScoringError> {
        let Some(previous_key) = key.previous() else {
            return Ok(None);
        };
        let Some(previous) = self.resolver.find(&previous_key).await? else {
            return Ok(None);
        };
        Ok(self.ports.scores.find_total(user_id, previous.id).await?)
    }
}

fn apply_assignments(scores: &mut [Score], scope: RankingScope, assignments: &[RankAssignment]) {
    for score in scores.iter_mut() {
        if let Some(a) = assignments.iter().find(|a| a.score_id == score.id) {
            score.apply_rank(scope, a.rank, a.percentile);
        }
    }
}
