//! Event Aggregator - selects scoreable events and groups them by rule.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::PerformanceEvent;
use crate::domain::foundation::{RuleId, UserId};

/// Approved in-window events of one user, grouped by rule.
///
/// Groups iterate in rule-id order and events within a group are sorted by
/// event id, so reductions over this structure are reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedEvents {
    groups: BTreeMap<RuleId, Vec<PerformanceEvent>>,
}

impl GroupedEvents {
    pub fn iter(&self) -> impl Iterator<Item = (&RuleId, &[PerformanceEvent])> {
        self.groups.iter().map(|(id, events)| (id, events.as_slice()))
    }

    pub fn get(&self, rule_id: &RuleId) -> Option<&[PerformanceEvent]> {
        self.groups.get(rule_id).map(Vec::as_slice)
    }

    pub fn rule_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of selected events across every group.
    pub fn event_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub struct EventAggregator;

impl EventAggregator {
    /// Groups the events of `user_id` that are approved and occurred within
    /// `[start, end]`. Everything else (other users, draft, pending, rejected,
    /// archived, out-of-window) is dropped.
    pub fn group_by_rule(
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
        events: impl IntoIterator<Item = PerformanceEvent>,
    ) -> GroupedEvents {
        let mut groups: BTreeMap<RuleId, Vec<PerformanceEvent>> = BTreeMap::new();

        for event in events {
            if event.user_id != user_id || !event.is_approved() {
                continue;
            }
            if event.occurred_at < start || event.occurred_at > end {
                continue;
            }
            groups.entry(event.rule_id).or_default().push(event);
        }

        for events in groups.values_mut() {
            events.sort_by_key(|e| e.id);
        }

        GroupedEvents { groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PerformanceEventId;
    use crate::domain::scoring::EventStatus;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: i64, user: i64, rule: i64, date: NaiveDate, status: EventStatus) -> PerformanceEvent {
        PerformanceEvent {
            id: PerformanceEventId::new(id),
            user_id: UserId::new(user),
            rule_id: RuleId::new(rule),
            occurred_at: date,
            status,
            original_score: 5.0,
            adjusted_score: None,
            final_score: 5.0,
        }
    }

    fn march() -> (NaiveDate, NaiveDate) {
        (ymd(2024, 3, 1), ymd(2024, 3, 31))
    }

    #[test]
    fn keeps_only_approved_events() {
        let (start, end) = march();
        let grouped = EventAggregator::group_by_rule(
            UserId::new(1),
            start,
            end,
            vec![
                event(1, 1, 1, ymd(2024, 3, 5), EventStatus::Approved),
                event(2, 1, 1, ymd(2024, 3, 5), EventStatus::Pending),
                event(3, 1, 1, ymd(2024, 3, 5), EventStatus::Rejected),
                event(4, 1, 1, ymd(2024, 3, 5), EventStatus::Draft),
                event(5, 1, 1, ymd(2024, 3, 5), EventStatus::Archived),
            ],
        );

        assert_eq!(grouped.event_count(), 1);
        assert_eq!(grouped.get(&RuleId::new(1)).unwrap()[0].id, PerformanceEventId::new(1));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let (start, end) = march();
        let grouped = EventAggregator::group_by_rule(
            UserId::new(1),
            start,
            end,
            vec![
                event(1, 1, 1, ymd(2024, 2, 29), EventStatus::Approved),
                event(2, 1, 1, ymd(2024, 3, 1), EventStatus::Approved),
                event(3, 1, 1, ymd(2024, 3, 31), EventStatus::Approved),
                event(4, 1, 1, ymd(2024, 4, 1), EventStatus::Approved),
            ],
        );

        let ids: Vec<i64> = grouped
            .get(&RuleId::new(1))
            .unwrap()
            .iter()
            .map(|e| e.id.value())
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn ignores_other_users() {
        let (start, end) = march();
        let grouped = EventAggregator::group_by_rule(
            UserId::new(1),
            start,
            end,
            vec![event(1, 2, 1, ymd(2024, 3, 5), EventStatus::Approved)],
        );
        assert!(grouped.is_empty());
    }

    #[test]
    fn groups_by_rule_and_sorts_by_event_id() {
        let (start, end) = march();
        let grouped = EventAggregator::group_by_rule(
            UserId::new(1),
            start,
            end,
            vec![
                event(9, 1, 2, ymd(2024, 3, 5), EventStatus::Approved),
                event(3, 1, 1, ymd(2024, 3, 5), EventStatus::Approved),
                event(7, 1, 2, ymd(2024, 3, 5), EventStatus::Approved),
                event(1, 1, 1, ymd(2024, 3, 5), EventStatus::Approved),
            ],
        );

        assert_eq!(grouped.rule_count(), 2);
        let rule_two: Vec<i64> = grouped
            .get(&RuleId::new(2))
            .unwrap()
            .iter()
            .map(|e| e.id.value())
            .collect();
        assert_eq!(rule_two, vec![7, 9]);

        let rule_order: Vec<i64> = grouped.iter().map(|(id, _)| id.value()).collect();
        assert_eq!(rule_order, vec![1, 2]);
    }
}
