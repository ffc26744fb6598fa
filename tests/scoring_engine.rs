//! End-to-end tests for the scoring engine.
//!
//! Drives `ScoringOrchestrator` through the in-memory adapters:
//! 1. Events are selected, grouped and capped per rule
//! 2. Scores are written once per user and period
//! 3. Batches rank their population after every score is stored
//! 4. Locked periods follow the configured policy

use std::sync::Arc;

use chrono::NaiveDate;

use hr_scoring::adapters::memory::{
    InMemoryAuditSink, InMemoryEmployeeDirectory, InMemoryEventSource, InMemoryPeriodRepository,
    InMemoryRuleSource, InMemoryScoreRepository,
};
use hr_scoring::application::{
    DepartmentSummaryHandler, PeriodLockHandler, PeriodResolver, ScoringOrchestrator, ScoringPorts,
};
use hr_scoring::config::{LockedPeriodPolicy, ScoringConfig};
use hr_scoring::domain::foundation::{DepartmentId, ErrorCode, PerformanceEventId, RuleId, UserId};
use hr_scoring::domain::period::PeriodKey;
use hr_scoring::domain::scoring::{EventStatus, PerformanceEvent, PerformanceTrend, Rule, RulePackWindow};
use hr_scoring::ports::{Employee, ScoreRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rule(id: i64, base_score: f64, caps: Option<f64>) -> Rule {
    Rule {
        id: RuleId::new(id),
        code: format!("RULE_{}", id),
        name: format!("Rule {}", id),
        base_score,
        weight: 1.0,
        caps,
        active: true,
        pack: RulePackWindow {
            effective_from: date(2023, 1, 1),
            effective_to: None,
        },
    }
}

fn event(id: i64, user: i64, rule: i64, on: NaiveDate, score: f64, status: EventStatus) -> PerformanceEvent {
    PerformanceEvent {
        id: PerformanceEventId::new(id),
        user_id: UserId::new(user),
        rule_id: RuleId::new(rule),
        occurred_at: on,
        status,
        original_score: score,
        adjusted_score: None,
        final_score: score,
    }
}

fn approved(id: i64, user: i64, rule: i64, on: NaiveDate, score: f64) -> PerformanceEvent {
    event(id, user, rule, on, score, EventStatus::Approved)
}

fn employee(id: i64, dept: i64) -> Employee {
    Employee {
        id: UserId::new(id),
        department_id: Some(DepartmentId::new(dept)),
        active: true,
    }
}

struct Engine {
    orchestrator: ScoringOrchestrator,
    locks: PeriodLockHandler,
    summaries: DepartmentSummaryHandler,
    resolver: PeriodResolver,
    events: Arc<InMemoryEventSource>,
    directory: Arc<InMemoryEmployeeDirectory>,
    scores: Arc<InMemoryScoreRepository>,
    audit: Arc<InMemoryAuditSink>,
}

impl Engine {
    fn new(rules: Vec<Rule>, events: Vec<PerformanceEvent>, employees: Vec<Employee>) -> Self {
        Self::with_config(rules, events, employees, ScoringConfig::default())
    }

    fn with_config(
        rules: Vec<Rule>,
        events: Vec<PerformanceEvent>,
        employees: Vec<Employee>,
        config: ScoringConfig,
    ) -> Self {
        let events = Arc::new(InMemoryEventSource::with_events(events));
        let directory = Arc::new(InMemoryEmployeeDirectory::with_employees(employees));
        let periods = Arc::new(InMemoryPeriodRepository::new());
        let scores = Arc::new(InMemoryScoreRepository::new());
        let audit = Arc::new(InMemoryAuditSink::new());

        let ports = ScoringPorts {
            events: events.clone(),
            rules: Arc::new(InMemoryRuleSource::with_rules(rules)),
            directory: directory.clone(),
            periods: periods.clone(),
            scores: scores.clone(),
            audit: audit.clone(),
        };

        Self {
            orchestrator: ScoringOrchestrator::new(ports, config),
            locks: PeriodLockHandler::new(periods.clone(), scores.clone(), audit.clone()),
            summaries: DepartmentSummaryHandler::new(periods.clone(), scores.clone()),
            resolver: PeriodResolver::new(periods),
            events,
            directory,
            scores,
            audit,
        }
    }
}

fn march() -> PeriodKey {
    PeriodKey::monthly(2024, 3).unwrap()
}

// =============================================================================
// Aggregation Scenarios
// =============================================================================

#[tokio::test]
async fn rejected_events_are_excluded_from_the_total() {
    let engine = Engine::new(
        vec![rule(1, 15.0, None)],
        vec![
            approved(1, 1, 1, date(2024, 3, 4), 15.0),
            approved(2, 1, 1, date(2024, 3, 18), 15.0),
            event(3, 1, 1, date(2024, 3, 20), 100.0, EventStatus::Rejected),
            event(4, 1, 1, date(2024, 3, 21), 40.0, EventStatus::Pending),
        ],
        vec![employee(1, 1)],
    );

    let score = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();

    assert_eq!(score.total_score, 30.0);
    assert_eq!(score.total_events, 2);
    assert_eq!(score.positive_events, 2);
    assert_eq!(score.negative_score, 0.0);
    assert_eq!(score.pending_events, 1);
}

#[tokio::test]
async fn negative_group_is_capped() {
    let engine = Engine::new(
        vec![rule(7, -10.0, Some(25.0))],
        (1..=4).map(|id| approved(id, 1, 7, date(2024, 3, id as u32), -10.0)).collect(),
        vec![employee(1, 1)],
    );

    let score = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();

    let entry = &score.rule_breakdown[&RuleId::new(7)];
    assert_eq!(entry.total_score, -25.0);
    assert_eq!(entry.original_total, -40.0);
    assert!(entry.cap_applied);
    assert_eq!(score.negative_score, -25.0);
    assert_eq!(score.total_score, -25.0);
}

#[tokio::test]
async fn positive_group_is_capped() {
    let engine = Engine::new(
        vec![rule(1, 10.0, Some(20.0))],
        (1..=3).map(|id| approved(id, 1, 1, date(2024, 3, 10), 10.0)).collect(),
        vec![employee(1, 1)],
    );

    let score = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();

    assert_eq!(score.total_score, 20.0);
    assert!(score.rule_breakdown[&RuleId::new(1)].cap_applied);
}

#[tokio::test]
async fn events_outside_the_window_are_ignored() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![
            approved(1, 1, 1, date(2024, 2, 29), 10.0),
            approved(2, 1, 1, date(2024, 3, 1), 10.0),
            approved(3, 1, 1, date(2024, 3, 31), 10.0),
            approved(4, 1, 1, date(2024, 4, 1), 10.0),
        ],
        vec![employee(1, 1)],
    );

    let score = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();

    assert_eq!(score.total_events, 2);
    assert_eq!(score.total_score, 20.0);
}

#[tokio::test]
async fn quarterly_scores_cover_three_months() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![
            approved(1, 1, 1, date(2024, 1, 15), 10.0),
            approved(2, 1, 1, date(2024, 2, 15), 10.0),
            approved(3, 1, 1, date(2024, 3, 15), 10.0),
            approved(4, 1, 1, date(2024, 4, 15), 10.0),
        ],
        vec![employee(1, 1)],
    );

    let key = PeriodKey::quarterly(2024, 1).unwrap();
    let score = engine.orchestrator.compute_for(UserId::new(1), key, false).await.unwrap();

    assert_eq!(score.total_score, 30.0);
    assert_eq!(score.period_key(), "2024-Q1");
}

// =============================================================================
// Idempotence and Uniqueness
// =============================================================================

#[tokio::test]
async fn unforced_recompute_is_idempotent() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![approved(1, 1, 1, date(2024, 3, 4), 10.0)],
        vec![employee(1, 1)],
    );

    let first = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();
    let second = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn forced_recompute_overwrites_in_place() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![approved(1, 1, 1, date(2024, 3, 4), 10.0)],
        vec![employee(1, 1)],
    );

    let first = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();
    engine.events.set_status(PerformanceEventId::new(1), EventStatus::Rejected).await;
    let second = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, true).await.unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.total_score, 0.0);
    assert_eq!(engine.scores.count().await, 1);
}

#[tokio::test]
async fn period_resolution_is_stable() {
    let engine = Engine::new(vec![], vec![], vec![]);

    let first = engine.resolver.resolve_monthly(2024, 3).await.unwrap();
    let second = engine.resolver.resolve_monthly(2024, 3).await.unwrap();

    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn concurrent_computations_of_one_user_keep_one_row() {
    let engine = Arc::new(Engine::new(
        vec![rule(1, 10.0, None)],
        vec![approved(1, 1, 1, date(2024, 3, 4), 10.0)],
        vec![employee(1, 1)],
    ));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine.orchestrator.compute_user(UserId::new(1), 2024, 3, true).await
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().total_score, 10.0);
    }

    assert_eq!(engine.scores.count().await, 1);
}

// =============================================================================
// Rankings
// =============================================================================

#[tokio::test]
async fn company_ranking_is_monotonic_with_sequential_ties() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![
            approved(1, 1, 1, date(2024, 3, 4), 10.0),
            approved(2, 2, 1, date(2024, 3, 4), 40.0),
            approved(3, 3, 1, date(2024, 3, 4), 40.0),
            approved(4, 4, 1, date(2024, 3, 4), 25.0),
        ],
        vec![employee(1, 1), employee(2, 1), employee(3, 2), employee(4, 2)],
    );

    let outcome = engine.orchestrator.compute_company(2024, 3, false).await.unwrap();

    let ranks: Vec<_> = outcome
        .scores
        .iter()
        .map(|s| (s.user_id.value(), s.rank_company.unwrap(), s.percentile_company.unwrap()))
        .collect();
    assert_eq!(ranks, vec![(1, 4, 25.0), (2, 1, 100.0), (3, 2, 75.0), (4, 3, 50.0)]);

    // Stored rows carry the same ranks.
    let period = engine.resolver.resolve(march()).await.unwrap();
    let stored = engine.scores.list_for_period(period.id, None).await.unwrap();
    assert!(stored.iter().all(|s| s.rank_company.is_some()));
    assert!(stored.iter().all(|s| s.rank_department.is_none()));
}

#[tokio::test]
async fn department_scope_uses_department_recorded_on_score() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![
            approved(1, 1, 1, date(2024, 3, 4), 10.0),
            approved(2, 2, 1, date(2024, 3, 4), 20.0),
        ],
        vec![employee(1, 1), employee(2, 1)],
    );
    engine.orchestrator.compute_department(DepartmentId::new(1), 2024, 3, false).await.unwrap();

    // A transfer after scoring does not move the existing score, even when
    // it is recomputed.
    engine.directory.transfer(UserId::new(2), Some(DepartmentId::new(2))).await;
    engine.orchestrator.compute_user(UserId::new(2), 2024, 3, true).await.unwrap();
    let outcome = engine
        .orchestrator
        .compute_department(DepartmentId::new(1), 2024, 3, true)
        .await
        .unwrap();

    assert_eq!(outcome.summary.total, 1);
    let period = engine.resolver.resolve(march()).await.unwrap();
    let moved = engine.scores.find(UserId::new(2), period.id).await.unwrap().unwrap();
    assert_eq!(moved.department_id, Some(DepartmentId::new(1)));
    assert_eq!(moved.rank_department, Some(1));
}

// =============================================================================
// Trend, Locking and Summaries
// =============================================================================

#[tokio::test]
async fn trend_compares_with_the_previous_month() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![
            approved(1, 1, 1, date(2024, 2, 10), 40.0),
            approved(2, 1, 1, date(2024, 3, 10), 30.0),
        ],
        vec![employee(1, 1)],
    );

    engine.orchestrator.compute_user(UserId::new(1), 2024, 2, false).await.unwrap();
    let score = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();

    assert_eq!(score.previous_total_score, Some(40.0));
    assert_eq!(score.score_change, Some(-10.0));
    assert_eq!(score.score_change_percent, Some(-25.0));
    assert_eq!(score.is_improvement(), Some(false));
    assert_eq!(score.performance_trend(5.0), PerformanceTrend::Declining);
}

#[tokio::test]
async fn january_trend_reads_december_of_previous_year() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![
            approved(1, 1, 1, date(2023, 12, 10), 10.0),
            approved(2, 1, 1, date(2024, 1, 10), 12.0),
        ],
        vec![employee(1, 1)],
    );

    engine.orchestrator.compute_user(UserId::new(1), 2023, 12, false).await.unwrap();
    let score = engine.orchestrator.compute_user(UserId::new(1), 2024, 1, false).await.unwrap();

    assert_eq!(score.previous_total_score, Some(10.0));
    assert_eq!(score.performance_trend(5.0), PerformanceTrend::Stable);
}

#[tokio::test]
async fn locked_period_blocks_recomputation_under_reject_policy() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![approved(1, 1, 1, date(2024, 3, 4), 10.0)],
        vec![employee(1, 1)],
    );
    let before = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();
    engine.locks.lock_period(march(), UserId::new(50)).await.unwrap();

    let cached = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();
    assert!(!before.is_locked);
    assert!(cached.is_locked);
    assert_eq!(cached.id, before.id);
    assert_eq!(cached.total_score, before.total_score);
    assert_eq!(cached.computed_at, before.computed_at);

    let err = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, true).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PeriodLocked);

    let err = engine.orchestrator.recalculate_period(2024, 3, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PeriodLocked);

    engine.locks.unlock_period(march(), UserId::new(50)).await.unwrap();
    let summary = engine.orchestrator.recalculate_period(2024, 3, None).await.unwrap();
    assert_eq!(summary.successful, 1);
}

#[tokio::test]
async fn recompute_policy_flags_scores_as_locked() {
    let config = ScoringConfig {
        locked_period_policy: LockedPeriodPolicy::Recompute,
        ..ScoringConfig::default()
    };
    let engine = Engine::with_config(
        vec![rule(1, 10.0, None)],
        vec![approved(1, 1, 1, date(2024, 3, 4), 10.0)],
        vec![employee(1, 1)],
        config,
    );
    engine.locks.lock_period(march(), UserId::new(50)).await.unwrap();

    let summary = engine.orchestrator.recalculate_period(2024, 3, None).await.unwrap();
    assert_eq!(summary.successful, 1);

    let period = engine.resolver.resolve(march()).await.unwrap();
    let score = engine.scores.find(UserId::new(1), period.id).await.unwrap().unwrap();
    assert!(score.is_locked);
}

#[tokio::test]
async fn stale_marking_refreshes_on_next_unforced_call() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![approved(1, 1, 1, date(2024, 3, 4), 10.0)],
        vec![employee(1, 1), employee(2, 1)],
    );
    engine.orchestrator.compute_company(2024, 3, false).await.unwrap();
    engine.events.push(approved(2, 1, 1, date(2024, 3, 5), 5.0)).await;

    let flagged = engine.locks.mark_period_stale(march()).await.unwrap();
    assert_eq!(flagged, 2);

    let score = engine.orchestrator.compute_user(UserId::new(1), 2024, 3, false).await.unwrap();
    assert_eq!(score.total_score, 15.0);
    assert!(!score.needs_recalculation);
}

#[tokio::test]
async fn department_summary_reflects_stored_scores() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None), rule(2, -5.0, None)],
        vec![
            approved(1, 1, 1, date(2024, 3, 4), 10.0),
            approved(2, 1, 2, date(2024, 3, 5), -5.0),
            approved(3, 2, 1, date(2024, 3, 4), 90.0),
        ],
        vec![employee(1, 1), employee(2, 1)],
    );
    engine.orchestrator.compute_department(DepartmentId::new(1), 2024, 3, false).await.unwrap();

    let summary = engine.summaries.handle(DepartmentId::new(1), march()).await.unwrap();

    assert_eq!(summary.employee_count, 2);
    assert_eq!(summary.average_score, 47.5);
    assert_eq!(summary.max_score, 90.0);
    assert_eq!(summary.min_score, 5.0);
    assert_eq!(summary.total_events, 3);
    assert_eq!(summary.total_negative_events, 1);
    let top = summary.top_performer.unwrap();
    assert_eq!(top.user_id, UserId::new(2));
    assert_eq!(top.grade, "A+");
}

#[tokio::test]
async fn every_batch_emits_audit_events() {
    let engine = Engine::new(
        vec![rule(1, 10.0, None)],
        vec![approved(1, 1, 1, date(2024, 3, 4), 10.0)],
        vec![employee(1, 1)],
    );

    engine.orchestrator.recalculate_period(2024, 3, None).await.unwrap();

    assert_eq!(engine.audit.events_of_type("score.computed.v1").await.len(), 1);
    assert_eq!(engine.audit.events_of_type("ranking.computed.v1").await.len(), 1);
    assert_eq!(engine.audit.events_of_type("period.recalculated.v1").await.len(), 1);
}
