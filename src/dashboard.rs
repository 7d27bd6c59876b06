use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::domain::{
    Budget, BudgetRule, Category, DashboardSummary, GoalProgress, Transaction,
};
use crate::rules;

/// How many recent transactions the dashboard lists.
pub const RECENT_LIMIT: usize = 10;

/// One budget row, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetRow {
    pub budget_id: i64,
    pub category_name: String,
    /// Effective limit after any active rule. Zero for harvest budgets.
    pub limit: Decimal,
    pub spent: Decimal,
    /// 0..=100, clamped. None for harvest budgets and zero limits.
    pub percent_used: Option<Decimal>,
    pub over_limit: bool,
    pub adjusted: bool,
    pub harvest: bool,
    /// Running total a harvest budget has accumulated.
    pub harvested: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct RecentTransaction {
    pub transaction: Transaction,
    pub category_name: String,
    /// True when an active rule currently targets this category.
    pub rule_applied: bool,
}

/// Everything the dashboard command prints, assembled in one place so the
/// handler only formats.
#[derive(Debug)]
pub struct DashboardView {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub negative_balance: bool,
    pub category_expenses: BTreeMap<String, Decimal>,
    pub budgets: Vec<BudgetRow>,
    pub recent: Vec<RecentTransaction>,
    pub goals: Vec<GoalProgress>,
}

/// Joins the summary, the raw budget/rule lists, and the latest transactions
/// into a single view. Transactions arrive newest-first from the backend and
/// are capped at [`RECENT_LIMIT`].
pub fn build_dashboard(
    summary: DashboardSummary,
    budgets: &[Budget],
    active_rules: &[&BudgetRule],
    transactions: Vec<Transaction>,
    categories: &[Category],
) -> DashboardView {
    let names: HashMap<i64, &str> = categories
        .iter()
        .map(|c| (c.category_id, c.name.as_str()))
        .collect();

    let budget_rows = budgets
        .iter()
        .map(|budget| budget_row(budget, active_rules, &summary, &names))
        .collect();

    let adjusted_categories: Vec<i64> = budgets
        .iter()
        .filter(|b| !b.is_harvest())
        .filter(|b| rules::rule_for_category(active_rules, b.category_id).is_some())
        .map(|b| b.category_id)
        .collect();

    let recent = transactions
        .into_iter()
        .take(RECENT_LIMIT)
        .map(|tx| {
            let category_name = names
                .get(&tx.category_id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("#{}", tx.category_id));
            let rule_applied = adjusted_categories.contains(&tx.category_id);
            RecentTransaction {
                transaction: tx,
                category_name,
                rule_applied,
            }
        })
        .collect();

    DashboardView {
        income: summary.income,
        expense: summary.expense,
        balance: summary.balance,
        negative_balance: summary.is_negative_balance,
        category_expenses: summary.category_expenses,
        budgets: budget_rows,
        recent,
        goals: summary.goals,
    }
}

fn budget_row(
    budget: &Budget,
    active_rules: &[&BudgetRule],
    summary: &DashboardSummary,
    names: &HashMap<i64, &str>,
) -> BudgetRow {
    let progress = summary
        .budget_progress
        .iter()
        .find(|p| p.budget_id == budget.budget_id);

    let spent = progress.map(|p| p.spent).unwrap_or(Decimal::ZERO);
    let category_name = progress
        .and_then(|p| p.category_name.clone())
        .or_else(|| names.get(&budget.category_id).map(|n| n.to_string()))
        .unwrap_or_else(|| format!("#{}", budget.category_id));

    if budget.is_harvest() {
        return BudgetRow {
            budget_id: budget.budget_id,
            category_name,
            limit: Decimal::ZERO,
            spent,
            percent_used: None,
            over_limit: false,
            adjusted: false,
            harvest: true,
            harvested: progress.and_then(|p| p.harvested_amount),
        };
    }

    let rule = rules::rule_for_category(active_rules, budget.category_id);
    // Prefer the server's precomputed figure when the summary carries one.
    let limit = progress
        .and_then(|p| p.adjusted_amount)
        .or_else(|| rule.map(|r| rules::adjusted_amount(budget, r)))
        .unwrap_or(budget.amount);

    let percent_used = if limit > Decimal::ZERO {
        let pct = (spent / limit * Decimal::from(100)).round_dp(1);
        Some(pct.min(Decimal::from(100)))
    } else {
        None
    };

    BudgetRow {
        budget_id: budget.budget_id,
        category_name,
        limit,
        spent,
        percent_used,
        over_limit: limit > Decimal::ZERO && spent > limit,
        adjusted: rule.is_some() || progress.and_then(|p| p.adjusted_amount).is_some(),
        harvest: false,
        harvested: None,
    }
}
