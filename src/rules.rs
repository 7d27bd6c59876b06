use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{AdjustmentKind, Budget, BudgetRule, CalendarEvent, RuleEvent};

/// Returns the rules that are in effect on `today`.
///
/// A custom rule is active when `today` falls inside its inclusive date range.
/// An exam-week / summer-break rule is active whenever any calendar event's
/// summary contains the matching keyword, case-insensitively; the event's own
/// date is intentionally not compared against `today` (observed backend
/// behavior, kept as-is).
pub fn active_rules<'a>(
    rules: &'a [BudgetRule],
    events: &[CalendarEvent],
    today: NaiveDate,
) -> Vec<&'a BudgetRule> {
    rules
        .iter()
        .filter(|rule| rule_is_active(rule, events, today))
        .collect()
}

fn rule_is_active(rule: &BudgetRule, events: &[CalendarEvent], today: NaiveDate) -> bool {
    match rule.event_type {
        RuleEvent::Custom => match (rule.start_date, rule.end_date) {
            (Some(start), Some(end)) => start <= today && today <= end,
            // Malformed custom rule; never active rather than always active.
            _ => false,
        },
        RuleEvent::ExamWeek => any_event_mentions(events, "exam"),
        RuleEvent::SummerBreak => any_event_mentions(events, "summer"),
    }
}

fn any_event_mentions(events: &[CalendarEvent], keyword: &str) -> bool {
    events
        .iter()
        .any(|e| e.summary.to_lowercase().contains(keyword))
}

/// First active rule targeting the budget's category, in server order.
pub fn rule_for_category<'a>(active: &[&'a BudgetRule], category_id: i64) -> Option<&'a BudgetRule> {
    active.iter().find(|r| r.category_id == category_id).copied()
}

/// The budget's effective limit under `rule`.
///
/// Harvest budgets are exempt: their amount is pinned to zero and no rule
/// ever applies to them.
pub fn adjusted_amount(budget: &Budget, rule: &BudgetRule) -> Decimal {
    if budget.is_harvest() {
        return Decimal::ZERO;
    }
    match rule.adjustment_type {
        AdjustmentKind::Percentage => {
            budget.amount * (Decimal::ONE + rule.adjustment_value / Decimal::from(100))
        }
        AdjustmentKind::FixedAmount => budget.amount + rule.adjustment_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BudgetPeriod;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn custom_rule(start: &str, end: &str) -> BudgetRule {
        BudgetRule {
            rule_id: 1,
            category_id: 10,
            event_type: RuleEvent::Custom,
            adjustment_type: AdjustmentKind::Percentage,
            adjustment_value: dec("10"),
            start_date: Some(date(start)),
            end_date: Some(date(end)),
        }
    }

    fn keyword_rule(event_type: RuleEvent) -> BudgetRule {
        BudgetRule {
            rule_id: 2,
            category_id: 11,
            event_type,
            adjustment_type: AdjustmentKind::FixedAmount,
            adjustment_value: dec("-50"),
            start_date: None,
            end_date: None,
        }
    }

    fn budget(amount: &str, period: BudgetPeriod) -> Budget {
        Budget {
            budget_id: 1,
            category_id: 10,
            amount: dec(amount),
            period,
            start_date: date("2025-01-01"),
            end_date: None,
            adjusted_amount: None,
        }
    }

    #[test]
    fn custom_rule_active_inside_inclusive_range_only() {
        let rules = vec![custom_rule("2025-01-01", "2025-01-31")];

        let active = active_rules(&rules, &[], date("2025-01-15"));
        assert_eq!(active.len(), 1);

        let boundary = active_rules(&rules, &[], date("2025-01-31"));
        assert_eq!(boundary.len(), 1);

        let after = active_rules(&rules, &[], date("2025-02-01"));
        assert!(after.is_empty());
    }

    #[test]
    fn exam_rule_keys_off_summary_keyword_not_event_date() {
        let rules = vec![keyword_rule(RuleEvent::ExamWeek)];
        // Event far in the past: still activates the rule.
        let events = vec![CalendarEvent {
            summary: "Final EXAM timetable".to_string(),
            start: date("2020-06-01"),
        }];

        let active = active_rules(&rules, &events, date("2025-01-15"));
        assert_eq!(active.len(), 1);

        let unrelated = vec![CalendarEvent {
            summary: "Dentist".to_string(),
            start: date("2025-01-15"),
        }];
        assert!(active_rules(&rules, &unrelated, date("2025-01-15")).is_empty());
    }

    #[test]
    fn summer_rule_matches_case_insensitively() {
        let rules = vec![keyword_rule(RuleEvent::SummerBreak)];
        let events = vec![CalendarEvent {
            summary: "SUMMER trip planning".to_string(),
            start: date("2025-07-01"),
        }];
        assert_eq!(active_rules(&rules, &events, date("2025-03-03")).len(), 1);
    }

    #[test]
    fn malformed_custom_rule_is_never_active() {
        let mut rule = custom_rule("2025-01-01", "2025-01-31");
        rule.end_date = None;
        assert!(active_rules(&[rule], &[], date("2025-01-15")).is_empty());
    }

    #[test]
    fn percentage_adjustment_scales_the_amount() {
        let budget = budget("1000", BudgetPeriod::Monthly);
        let mut rule = custom_rule("2025-01-01", "2025-01-31");
        rule.adjustment_type = AdjustmentKind::Percentage;
        rule.adjustment_value = dec("10");
        assert_eq!(adjusted_amount(&budget, &rule), dec("1100"));
    }

    #[test]
    fn fixed_adjustment_shifts_the_amount() {
        let budget = budget("1000", BudgetPeriod::Monthly);
        let mut rule = custom_rule("2025-01-01", "2025-01-31");
        rule.adjustment_type = AdjustmentKind::FixedAmount;
        rule.adjustment_value = dec("-200");
        assert_eq!(adjusted_amount(&budget, &rule), dec("800"));
    }

    #[test]
    fn harvest_budgets_are_exempt_from_adjustment() {
        let budget = budget("0", BudgetPeriod::PointsHarvest);
        let rule = custom_rule("2025-01-01", "2025-12-31");
        assert_eq!(adjusted_amount(&budget, &rule), Decimal::ZERO);
    }

    #[test]
    fn first_active_rule_wins_for_a_category() {
        let first = custom_rule("2025-01-01", "2025-12-31");
        let mut second = custom_rule("2025-01-01", "2025-12-31");
        second.rule_id = 99;
        second.adjustment_value = dec("50");
        let rules = vec![first, second];

        let active = active_rules(&rules, &[], date("2025-06-01"));
        let winner = rule_for_category(&active, 10).unwrap();
        assert_eq!(winner.rule_id, 1);
    }
}
