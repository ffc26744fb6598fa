//! Rule Cap Applier - reduces grouped events to a period score aggregate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{GroupedEvents, RuleSet};
use crate::domain::foundation::RuleId;

/// Per-rule contribution recorded on a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBreakdownEntry {
    pub rule_name: String,
    pub events: u32,
    /// Contribution after the cap.
    pub total_score: f64,
    /// Sum of event scores before the cap.
    pub original_total: f64,
    pub cap_applied: bool,
}

/// Result of aggregating one user's events for one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreAggregate {
    pub total_score: f64,
    pub positive_score: f64,
    pub negative_score: f64,
    /// Sum of manual adjustment deltas. Informational, not part of `total_score`.
    pub adjusted_score: f64,
    pub total_events: u32,
    pub positive_events: u32,
    pub negative_events: u32,
    pub rule_breakdown: BTreeMap<RuleId, RuleBreakdownEntry>,
}

impl ScoreAggregate {
    pub fn has_adjustments(&self) -> bool {
        self.adjusted_score != 0.0
    }
}

pub struct RuleCapApplier;

impl RuleCapApplier {
    /// Sums each rule group, clamps it to the rule's cap, and accumulates
    /// the period totals.
    ///
    /// Groups whose rule is not in `rules` (deactivated or deleted rules) are
    /// skipped and contribute nothing. Event counts use each event's own sign,
    /// regardless of capping. Rounding to two decimals happens once, on the
    /// final figures.
    pub fn apply(grouped: &GroupedEvents, rules: &RuleSet) -> ScoreAggregate {
        let mut total = 0.0_f64;
        let mut positive = 0.0_f64;
        let mut negative = 0.0_f64;
        let mut adjusted = 0.0_f64;
        let mut positive_events = 0_u32;
        let mut negative_events = 0_u32;
        let mut breakdown = BTreeMap::new();

        for (rule_id, events) in grouped.iter() {
            let Some(rule) = rules.get(rule_id) else {
                continue;
            };

            let mut raw_total = 0.0_f64;
            for event in events {
                raw_total += event.final_score;

                if event.final_score > 0.0 {
                    positive_events += 1;
                } else if event.final_score < 0.0 {
                    negative_events += 1;
                }

                if let Some(delta) = event.adjustment_delta() {
                    adjusted += delta;
                }
            }

            let (capped_total, cap_applied) = match rule.effective_cap() {
                Some(cap) if raw_total.abs() > cap => (cap.copysign(raw_total), true),
                _ => (raw_total, false),
            };

            total += capped_total;
            if capped_total > 0.0 {
                positive += capped_total;
            } else if capped_total < 0.0 {
                negative += capped_total;
            }

            breakdown.insert(
                *rule_id,
                RuleBreakdownEntry {
                    rule_name: rule.name.clone(),
                    events: events.len() as u32,
                    total_score: round2(capped_total),
                    original_total: round2(raw_total),
                    cap_applied,
                },
            );
        }

        ScoreAggregate {
            total_score: round2(total),
            positive_score: round2(positive),
            negative_score: round2(negative),
            adjusted_score: round2(adjusted),
            total_events: grouped.event_count() as u32,
            positive_events,
            negative_events,
            rule_breakdown: breakdown,
        }
    }
}

/// Rounds half away from zero to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{PerformanceEventId, UserId};
    use crate::domain::scoring::{EventAggregator, EventStatus, PerformanceEvent, Rule, RulePackWindow};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(id: i64, caps: Option<f64>) -> Rule {
        Rule {
            id: RuleId::new(id),
            code: format!("R{}", id),
            name: format!("Rule {}", id),
            base_score: 10.0,
            weight: 1.0,
            caps,
            active: true,
            pack: RulePackWindow {
                effective_from: ymd(2024, 1, 1),
                effective_to: None,
            },
        }
    }

    fn event(id: i64, rule: i64, score: f64) -> PerformanceEvent {
        PerformanceEvent {
            id: PerformanceEventId::new(id),
            user_id: UserId::new(1),
            rule_id: RuleId::new(rule),
            occurred_at: ymd(2024, 3, 10),
            status: EventStatus::Approved,
            original_score: score,
            adjusted_score: None,
            final_score: score,
        }
    }

    fn aggregate(events: Vec<PerformanceEvent>, rules: Vec<Rule>) -> ScoreAggregate {
        let grouped =
            EventAggregator::group_by_rule(UserId::new(1), ymd(2024, 3, 1), ymd(2024, 3, 31), events);
        let set = RuleSet::active_for(rules, ymd(2024, 3, 1));
        RuleCapApplier::apply(&grouped, &set)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Caps
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn positive_group_is_capped() {
        let agg = aggregate(
            vec![event(1, 1, 10.0), event(2, 1, 10.0), event(3, 1, 10.0)],
            vec![rule(1, Some(20.0))],
        );

        let entry = &agg.rule_breakdown[&RuleId::new(1)];
        assert_eq!(entry.total_score, 20.0);
        assert_eq!(entry.original_total, 30.0);
        assert!(entry.cap_applied);
        assert_eq!(agg.total_score, 20.0);
        assert_eq!(agg.positive_score, 20.0);
    }

    #[test]
    fn negative_group_is_capped_symmetrically() {
        let agg = aggregate(
            (1..=4).map(|i| event(i, 1, -10.0)).collect(),
            vec![rule(1, Some(25.0))],
        );

        let entry = &agg.rule_breakdown[&RuleId::new(1)];
        assert_eq!(entry.total_score, -25.0);
        assert!(entry.cap_applied);
        assert_eq!(agg.negative_score, -25.0);
        assert_eq!(agg.total_score, -25.0);
        assert_eq!(agg.negative_events, 4);
    }

    #[test]
    fn total_exactly_at_cap_is_not_capped() {
        let agg = aggregate(vec![event(1, 1, 10.0), event(2, 1, 10.0)], vec![rule(1, Some(20.0))]);
        assert!(!agg.rule_breakdown[&RuleId::new(1)].cap_applied);
        assert_eq!(agg.total_score, 20.0);
    }

    #[test]
    fn uncapped_rule_sums_everything() {
        let agg = aggregate(vec![event(1, 1, 15.0), event(2, 1, 15.0)], vec![rule(1, None)]);
        assert_eq!(agg.total_score, 30.0);
        assert!(!agg.rule_breakdown[&RuleId::new(1)].cap_applied);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Accumulation
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn positive_and_negative_scores_follow_group_sign() {
        // Rule 1 nets +5 from mixed events, rule 2 nets -8.
        let agg = aggregate(
            vec![event(1, 1, 10.0), event(2, 1, -5.0), event(3, 2, -8.0)],
            vec![rule(1, None), rule(2, None)],
        );

        assert_eq!(agg.positive_score, 5.0);
        assert_eq!(agg.negative_score, -8.0);
        assert_eq!(agg.total_score, -3.0);
        assert_eq!(agg.total_score, agg.positive_score + agg.negative_score);
        assert_eq!(agg.positive_events, 1);
        assert_eq!(agg.negative_events, 2);
    }

    #[test]
    fn zero_scores_count_in_neither_bucket() {
        let agg = aggregate(vec![event(1, 1, 0.0)], vec![rule(1, None)]);
        assert_eq!(agg.positive_events, 0);
        assert_eq!(agg.negative_events, 0);
        assert_eq!(agg.positive_score, 0.0);
        assert_eq!(agg.negative_score, 0.0);
        assert_eq!(agg.total_events, 1);
    }

    #[test]
    fn event_counts_ignore_capping() {
        let agg = aggregate(
            vec![event(1, 1, 10.0), event(2, 1, 10.0), event(3, 1, 10.0)],
            vec![rule(1, Some(5.0))],
        );
        assert_eq!(agg.positive_events, 3);
    }

    #[test]
    fn orphaned_rule_groups_are_skipped() {
        let mut inactive = rule(2, None);
        inactive.active = false;

        let agg = aggregate(
            vec![event(1, 1, 10.0), event(2, 2, 50.0), event(3, 3, 70.0)],
            vec![rule(1, None), inactive],
        );

        assert_eq!(agg.total_score, 10.0);
        assert_eq!(agg.rule_breakdown.len(), 1);
        assert_eq!(agg.positive_events, 1);
    }

    #[test]
    fn adjustments_are_tracked_but_not_added_again() {
        let mut adjusted = event(2, 1, 4.0);
        adjusted.original_score = 10.0;
        adjusted.adjusted_score = Some(4.0);

        let agg = aggregate(vec![event(1, 1, 10.0), adjusted], vec![rule(1, Some(12.0))]);

        assert_eq!(agg.total_score, 12.0);
        assert_eq!(agg.adjusted_score, -6.0);
        assert!(agg.has_adjustments());
    }

    #[test]
    fn rounding_happens_only_on_final_figures() {
        // Rounding each event first would give 0.99.
        let agg = aggregate(
            vec![event(1, 1, 0.333), event(2, 1, 0.333), event(3, 1, 0.333)],
            vec![rule(1, None)],
        );
        assert_eq!(agg.total_score, 1.0);
        assert_eq!(agg.rule_breakdown[&RuleId::new(1)].original_total, 1.0);
    }

    #[test]
    fn no_events_yield_an_empty_aggregate() {
        let agg = aggregate(vec![], vec![rule(1, None)]);
        assert_eq!(agg, ScoreAggregate::default());
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(-2.345_000_1), -2.35);
        assert_eq!(round2(3.0), 3.0);
    }

    proptest! {
        #[test]
        fn result_is_independent_of_insertion_order(
            scores in prop::collection::vec((1i64..4, -50i32..50), 0..30),
            seed in any::<u64>(),
        ) {
            let events: Vec<PerformanceEvent> = scores
                .iter()
                .enumerate()
                .map(|(i, (rule_id, score))| event(i as i64 + 1, *rule_id, *score as f64 / 4.0))
                .collect();

            let mut shuffled = events.clone();
            // Deterministic permutation derived from the seed.
            let len = shuffled.len();
            if len > 1 {
                for i in 0..len {
                    let j = ((seed.wrapping_mul(i as u64 + 1)) % len as u64) as usize;
                    shuffled.swap(i, j);
                }
            }

            let rules = vec![rule(1, Some(30.0)), rule(2, None), rule(3, Some(5.0))];
            let a = aggregate(events, rules.clone());
            let b = aggregate(shuffled, rules);

            prop_assert_eq!(a.total_score, b.total_score);
            prop_assert_eq!(a.rule_breakdown, b.rule_breakdown);
        }

        #[test]
        fn capped_contributions_never_exceed_their_cap(
            scores in prop::collection::vec(-40i32..40, 1..20),
        ) {
            let events: Vec<PerformanceEvent> = scores
                .iter()
                .enumerate()
                .map(|(i, s)| event(i as i64 + 1, 1, *s as f64))
                .collect();

            let agg = aggregate(events, vec![rule(1, Some(25.0))]);
            prop_assert!(agg.rule_breakdown[&RuleId::new(1)].total_score.abs() <= 25.0);
            prop_assert!(agg.total_score.abs() <= 25.0);
        }
    }
}
