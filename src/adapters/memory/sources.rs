//! In-memory read-side adapters.
//!
//! Fixture-backed implementations of the event, rule and employee ports.
//! Used by tests and local runs.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::foundation::{DepartmentId, DomainError, PerformanceEventId, UserId};
use crate::domain::scoring::{EventStatus, PerformanceEvent, Rule};
use crate::ports::{Employee, EmployeeDirectory, PerformanceEventSource, RuleSource};

fn in_window(event: &PerformanceEvent, user_id: UserId, start: NaiveDate, end: NaiveDate) -> bool {
    event.user_id == user_id && event.occurred_at >= start && event.occurred_at <= end
}

/// Performance events held in memory.
#[derive(Default)]
pub struct InMemoryEventSource {
    events: RwLock<Vec<PerformanceEvent>>,
}

impl InMemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<PerformanceEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    pub async fn push(&self, event: PerformanceEvent) {
        self.events.write().await.push(event);
    }

    /// Changes the status of an event, e.g. to simulate a late approval.
    pub async fn set_status(&self, id: PerformanceEventId, status: EventStatus) {
        let mut events = self.events.write().await;
        if let Some(event) = events.iter_mut().find(|e| e.id == id) {
            event.status = status;
        }
    }
}

#[async_trait]
impl PerformanceEventSource for InMemoryEventSource {
    async fn approved_events(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PerformanceEvent>, DomainError> {
        let events = self.events.read().await;
        let mut selected: Vec<PerformanceEvent> = events
            .iter()
            .filter(|e| e.is_approved() && in_window(e, user_id, start, end))
            .cloned()
            .collect();
        selected.sort_by_key(|e| e.id);
        Ok(selected)
    }

    async fn count_pending(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u32, DomainError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.status == EventStatus::Pending && in_window(e, user_id, start, end))
            .count() as u32)
    }
}

/// Rules held in memory.
#[derive(Default)]
pub struct InMemoryRuleSource {
    rules: RwLock<Vec<Rule>>,
}

impl InMemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Inserts or replaces a rule by id.
    pub async fn upsert(&self, rule: Rule) {
        let mut rules = self.rules.write().await;
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
    }
}

#[async_trait]
impl RuleSource for InMemoryRuleSource {
    async fn active_rules(&self, effective_at: NaiveDate) -> Result<Vec<Rule>, DomainError> {
        let rules = self.rules.read().await;
        Ok(rules
            .iter()
            .filter(|r| r.is_active_for(effective_at))
            .cloned()
            .collect())
    }
}

/// Employees held in memory.
#[derive(Default)]
pub struct InMemoryEmployeeDirectory {
    employees: RwLock<Vec<Employee>>,
}

impl InMemoryEmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employees(employees: Vec<Employee>) -> Self {
        Self {
            employees: RwLock::new(employees),
        }
    }

    /// Moves a user to another department, e.g. to simulate a transfer.
    pub async fn transfer(&self, user_id: UserId, department_id: Option<DepartmentId>) {
        let mut employees = self.employees.write().await;
        if let Some(e) = employees.iter_mut().find(|e| e.id == user_id) {
            e.department_id = department_id;
        }
    }

    async fn sorted_where(&self, predicate: impl Fn(&Employee) -> bool) -> Vec<Employee> {
        let employees = self.employees.read().await;
        let mut matched: Vec<Employee> = employees.iter().filter(|e| predicate(e)).copied().collect();
        matched.sort_by_key(|e| e.id);
        matched
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryEmployeeDirectory {
    async fn find_employee(&self, user_id: UserId) -> Result<Option<Employee>, DomainError> {
        let employees = self.employees.read().await;
        Ok(employees.iter().find(|e| e.id == user_id).copied())
    }

    async fn active_in_department(
        &self,
        department_id: DepartmentId,
    ) -> Result<Vec<Employee>, DomainError> {
        Ok(self
            .sorted_where(|e| e.active && e.department_id == Some(department_id))
            .await)
    }

    async fn all_active(&self) -> Result<Vec<Employee>, DomainError> {
        Ok(self.sorted_where(|e| e.active).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RuleId;
    use crate::domain::scoring::RulePackWindow;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: i64, user: i64, status: EventStatus, date: NaiveDate) -> PerformanceEvent {
        PerformanceEvent {
            id: PerformanceEventId::new(id),
            user_id: UserId::new(user),
            rule_id: RuleId::new(1),
            occurred_at: date,
            status,
            original_score: 1.0,
            adjusted_score: None,
            final_score: 1.0,
        }
    }

    #[tokio::test]
    async fn approved_events_are_filtered_and_ordered() {
        let source = InMemoryEventSource::with_events(vec![
            event(5, 1, EventStatus::Approved, ymd(2024, 3, 2)),
            event(2, 1, EventStatus::Approved, ymd(2024, 3, 9)),
            event(3, 1, EventStatus::Pending, ymd(2024, 3, 9)),
            event(4, 2, EventStatus::Approved, ymd(2024, 3, 9)),
            event(1, 1, EventStatus::Approved, ymd(2024, 4, 1)),
        ]);

        let events = source
            .approved_events(UserId::new(1), ymd(2024, 3, 1), ymd(2024, 3, 31))
            .await
            .unwrap();
        let ids: Vec<i64> = events.iter().map(|e| e.id.value()).collect();
        assert_eq!(ids, vec![2, 5]);

        let pending = source
            .count_pending(UserId::new(1), ymd(2024, 3, 1), ymd(2024, 3, 31))
            .await
            .unwrap();
        assert_eq!(pending, 1);
    }

    #[tokio::test]
    async fn status_change_is_visible_to_later_reads() {
        let source = InMemoryEventSource::with_events(vec![event(1, 1, EventStatus::Pending, ymd(2024, 3, 2))]);
        source.set_status(PerformanceEventId::new(1), EventStatus::Approved).await;

        let events = source
            .approved_events(UserId::new(1), ymd(2024, 3, 1), ymd(2024, 3, 31))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn rule_source_returns_active_rules() {
        let rule = |id: i64, active: bool| Rule {
            id: RuleId::new(id),
            code: format!("R{}", id),
            name: format!("Rule {}", id),
            base_score: 1.0,
            weight: 1.0,
            caps: None,
            active,
            pack: RulePackWindow {
                effective_from: ymd(2024, 1, 1),
                effective_to: None,
            },
        };
        let source = InMemoryRuleSource::with_rules(vec![rule(1, true), rule(2, false)]);
        let rules = source.active_rules(ymd(2024, 3, 1)).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, RuleId::new(1));
    }

    #[tokio::test]
    async fn directory_lists_active_members_in_id_order() {
        let emp = |id: i64, dept: i64, active: bool| Employee {
            id: UserId::new(id),
            department_id: Some(DepartmentId::new(dept)),
            active,
        };
        let directory = InMemoryEmployeeDirectory::with_employees(vec![
            emp(3, 1, true),
            emp(1, 1, true),
            emp(2, 1, false),
            emp(4, 2, true),
        ]);

        let dept: Vec<i64> = directory
            .active_in_department(DepartmentId::new(1))
            .await
            .unwrap()
            .iter()
            .map(|e| e.id.value())
            .collect();
        assert_eq!(dept, vec![1, 3]);
        assert_eq!(directory.all_active().await.unwrap().len(), 3);
        assert!(directory.find_employee(UserId::new(2)).await.unwrap().is_some());
        assert!(directory.find_employee(UserId::new(99)).await.unwrap().is_none());
    }
}
