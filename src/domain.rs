use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: i64,
    pub category_id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
    /// No fixed limit; accumulates a running total for later harvesting.
    PointsHarvest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub budget_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Present when the server already resolved an adjustment for this budget.
    #[serde(default)]
    pub adjusted_amount: Option<Decimal>,
}

impl Budget {
    pub fn is_harvest(&self) -> bool {
        self.period == BudgetPeriod::PointsHarvest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEvent {
    ExamWeek,
    SummerBreak,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Percentage,
    FixedAmount,
}

/// A condition that temporarily changes a budget's effective limit.
///
/// Invariant: `Custom` rules always carry both dates; non-custom rules never do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRule {
    pub rule_id: i64,
    pub category_id: i64,
    pub event_type: RuleEvent,
    pub adjustment_type: AdjustmentKind,
    pub adjustment_value: Decimal,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingGoal {
    pub goal_id: i64,
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Option<Decimal>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub progress_percentage: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiggyBank {
    pub balance: Decimal,
    #[serde(default)]
    pub decorations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub challenge_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub reward_points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChallenge {
    pub user_challenge_id: i64,
    pub status: ChallengeStatus,
    #[serde(rename = "Challenge", default)]
    pub challenge: Option<Challenge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub name: String,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub conversion_id: i64,
    pub from_currency: String,
    pub to_currency: String,
    pub amount: Decimal,
    pub result: Decimal,
    pub conversion_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Sad,
    Productive,
    Relaxed,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Productive => "productive",
            Mood::Relaxed => "relaxed",
        }
    }
}

/// Server-side settings merged into the local snapshot on `settings show`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub mood_based_theme: bool,
    #[serde(default)]
    pub current_mood: Option<Mood>,
    #[serde(default)]
    pub preferred_currency: Currency,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            points: 0,
            badges: Vec::new(),
            mood_based_theme: false,
            current_mood: None,
            preferred_currency: Currency::default(),
        }
    }
}

/// Derived presentation theme. Pure value; callers render it, nothing mutates
/// shared UI state from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Default,
    Mood(Mood),
}

impl Theme {
    pub fn class_name(self) -> String {
        match self {
            Theme::Default => String::new(),
            Theme::Mood(mood) => format!("theme-{}", mood.as_str()),
        }
    }
}

/// A mood theme applies only when the user opted in; the mood falls back to
/// `Productive` when unset.
pub fn theme(settings: &SettingsSnapshot) -> Theme {
    if settings.mood_based_theme {
        Theme::Mood(settings.current_mood.unwrap_or(Mood::Productive))
    } else {
        Theme::Default
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal_id: i64,
    pub name: String,
    #[serde(default)]
    pub progress_percentage: Option<Decimal>,
}

/// One budget's derived progress as reported by `/dashboard/summary`.
///
/// `adjusted_amount` is present exactly when an active rule matched the
/// budget's category at summary time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub budget_id: i64,
    #[serde(default)]
    pub category_name: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub adjusted_amount: Option<Decimal>,
    pub spent: Decimal,
    #[serde(default)]
    pub is_harvest_budget: bool,
    #[serde(default)]
    pub harvested_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default)]
    pub income: Decimal,
    #[serde(default)]
    pub expense: Decimal,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub is_negative_balance: bool,
    #[serde(default)]
    pub category_expenses: std::collections::BTreeMap<String, Decimal>,
    #[serde(default)]
    pub budget_progress: Vec<BudgetProgress>,
    #[serde(default)]
    pub goals: Vec<GoalProgress>,
}
