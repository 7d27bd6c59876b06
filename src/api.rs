use chrono::NaiveDate;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{
    AdjustmentKind, Budget, BudgetPeriod, BudgetRule, CalendarEvent, Category, Challenge,
    Conversion, DashboardSummary, LeaderboardEntry, Mood, PiggyBank, RuleEvent, SavingGoal,
    SettingsSnapshot, Transaction, TransactionKind, UserChallenge,
};
use crate::rates::HistoricalRateSource;

/// Every failure a backend call can produce, split the way the command layer
/// reacts to them: 401 clears the session, other 4xx/5xx surface the server's
/// message, anything transport-level is a network error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session expired or invalid. Run: finley login")]
    Unauthorized,
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub category_id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub category_id: i64,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetRule {
    pub category_id: i64,
    pub event_type: RuleEvent,
    pub adjustment_type: AdjustmentKind,
    pub adjustment_value: Decimal,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavingGoal {
    pub name: String,
    pub target_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub mood_based_theme: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_mood: Option<Mood>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertOutcome {
    pub amount: Decimal,
    pub from: String,
    pub to: String,
    pub result: Decimal,
}

#[derive(Debug, Deserialize)]
struct HistoricalRate {
    rate: Option<Decimal>,
}

/// The transactions endpoint answers either a bare array or a paged wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransactionsBody {
    Paged { transactions: Vec<Transaction> },
    Bare(Vec<Transaction>),
}

/// Blocking client for the Finley backend. One instance per command run; the
/// bearer token comes from the cached session blob.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> ApiResult<Self> {
        // A hard timeout so a stalled backend never hangs the spinner forever.
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn decode<T: DeserializeOwned>(resp: reqwest::blocking::Response) -> ApiResult<T> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("Request failed: HTTP {status}"));
            return Err(ApiError::Rejected { status, message });
        }
        Ok(resp.json::<T>()?)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        let resp = self
            .authed(self.http.get(self.url(path)))
            .query(query)
            .send()?;
        Self::decode(resp)
    }

    fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let resp = self
            .authed(self.http.post(self.url(path)))
            .json(body)
            .send()?;
        Self::decode(resp)
    }

    fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let resp = self
            .authed(self.http.put(self.url(path)))
            .json(body)
            .send()?;
        Self::decode(resp)
    }

    fn delete(&self, path: &str) -> ApiResult<()> {
        let resp = self.authed(self.http.delete(self.url(path))).send()?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("Request failed: HTTP {status}"));
            return Err(ApiError::Rejected { status, message });
        }
        Ok(())
    }

    // ---- auth ----

    pub fn login(&self, email: &str, password: &str) -> ApiResult<AuthUser> {
        self.post(
            "/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<AuthUser> {
        self.post(
            "/auth/register",
            &serde_json::json!({ "name": name, "email": email, "password": password }),
        )
    }

    // ---- transactions ----

    pub fn transactions(&self, page: u32, page_size: u32) -> ApiResult<Vec<Transaction>> {
        let body: TransactionsBody = self.get(
            "/transactions",
            &[
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ],
        )?;
        Ok(match body {
            TransactionsBody::Paged { transactions } => transactions,
            TransactionsBody::Bare(transactions) => transactions,
        })
    }

    pub fn create_transaction(&self, tx: &NewTransaction) -> ApiResult<Transaction> {
        self.post("/transactions", tx)
    }

    pub fn update_transaction(&self, id: i64, tx: &NewTransaction) -> ApiResult<Transaction> {
        self.put(&format!("/transactions/{id}"), tx)
    }

    pub fn delete_transaction(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/transactions/{id}"))
    }

    // ---- categories ----

    pub fn categories(&self) -> ApiResult<Vec<Category>> {
        self.get("/settings/category", &[])
    }

    pub fn create_category(&self, name: &str, kind: TransactionKind) -> ApiResult<Category> {
        self.post(
            "/settings/category",
            &serde_json::json!({ "name": name, "type": kind }),
        )
    }

    // ---- budgets ----

    pub fn budgets(&self) -> ApiResult<Vec<Budget>> {
        self.get("/budgets", &[])
    }

    pub fn create_budget(&self, budget: &NewBudget) -> ApiResult<Budget> {
        self.post("/budgets", budget)
    }

    pub fn update_budget(&self, id: i64, budget: &NewBudget) -> ApiResult<Budget> {
        self.put(&format!("/budgets/{id}"), budget)
    }

    pub fn delete_budget(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/budgets/{id}"))
    }

    // ---- budget rules / calendar ----

    pub fn budget_rules(&self) -> ApiResult<Vec<BudgetRule>> {
        self.get("/settings/budget-rules", &[])
    }

    pub fn create_budget_rule(&self, rule: &NewBudgetRule) -> ApiResult<BudgetRule> {
        self.post("/settings/budget-rule", rule)
    }

    pub fn delete_budget_rule(&self, rule_id: i64) -> ApiResult<()> {
        self.delete(&format!("/settings/budget-rule/{rule_id}"))
    }

    pub fn calendar_events(&self) -> ApiResult<Vec<CalendarEvent>> {
        self.get("/settings/calendar-events", &[])
    }

    // ---- saving goals ----

    pub fn saving_goals(&self) -> ApiResult<Vec<SavingGoal>> {
        self.get("/saving-goals", &[])
    }

    pub fn create_saving_goal(&self, goal: &NewSavingGoal) -> ApiResult<SavingGoal> {
        self.post("/saving-goals", goal)
    }

    pub fn delete_saving_goal(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/saving-goals/{id}"))
    }

    pub fn deposit_to_goal(&self, id: i64, amount: Decimal) -> ApiResult<SavingGoal> {
        self.post(
            &format!("/saving-goals/{id}/deposit"),
            &serde_json::json!({ "amount": amount }),
        )
    }

    // ---- piggy bank ----

    pub fn piggy_bank(&self) -> ApiResult<PiggyBank> {
        self.get("/piggy-bank", &[])
    }

    pub fn deposit_to_piggy(&self, amount: Decimal) -> ApiResult<PiggyBank> {
        self.post("/piggy-bank/deposit", &serde_json::json!({ "amount": amount }))
    }

    // ---- challenges ----

    pub fn user_challenges(&self) -> ApiResult<Vec<UserChallenge>> {
        self.get("/challenges/user", &[])
    }

    pub fn random_challenge(&self) -> ApiResult<Challenge> {
        self.get("/challenges/random", &[])
    }

    pub fn start_challenge(&self, challenge_id: i64) -> ApiResult<UserChallenge> {
        self.post(
            "/challenges/start",
            &serde_json::json!({ "challengeId": challenge_id }),
        )
    }

    pub fn complete_challenge(&self, user_challenge_id: i64) -> ApiResult<serde_json::Value> {
        self.post(
            "/settings/challenges/complete",
            &serde_json::json!({ "userChallengeId": user_challenge_id }),
        )
    }

    pub fn delete_challenge(&self, user_challenge_id: i64) -> ApiResult<()> {
        self.delete(&format!("/settings/challenges/{user_challenge_id}"))
    }

    // ---- leaderboard ----

    pub fn leaderboard(&self) -> ApiResult<Vec<LeaderboardEntry>> {
        self.get("/settings/leaderboard", &[])
    }

    pub fn leaderboard_history(&self, user_id: i64) -> ApiResult<Vec<LeaderboardEntry>> {
        self.get(&format!("/settings/leaderboard/history/{user_id}"), &[])
    }

    // ---- currency ----

    pub fn convert_currency(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> ApiResult<ConvertOutcome> {
        self.post(
            "/currency/convert",
            &serde_json::json!({ "from": from, "to": to, "amount": amount }),
        )
    }

    pub fn conversion_history(&self) -> ApiResult<Vec<Conversion>> {
        self.get("/currency/history", &[])
    }

    // ---- settings / dashboard ----

    pub fn settings(&self) -> ApiResult<SettingsSnapshot> {
        self.get("/settings", &[])
    }

    pub fn update_settings(&self, update: &SettingsUpdate) -> ApiResult<SettingsSnapshot> {
        self.put("/settings", update)
    }

    pub fn convert_points(&self, points: i64) -> ApiResult<serde_json::Value> {
        self.post(
            "/settings/convert-points",
            &serde_json::json!({ "points": points }),
        )
    }

    pub fn export_data(&self) -> ApiResult<serde_json::Value> {
        self.get("/settings/export", &[])
    }

    pub fn dashboard_summary(&self, month: u32, year: i32) -> ApiResult<DashboardSummary> {
        self.get(
            "/dashboard/summary",
            &[("month", month.to_string()), ("year", year.to_string())],
        )
    }
}

impl HistoricalRateSource for ApiClient {
    fn rate_on(&self, from: &str, to: &str, date: NaiveDate) -> anyhow::Result<Option<Decimal>> {
        let body: HistoricalRate = self.get(
            "/currency/historical",
            &[
                ("from", from.to_string()),
                ("to", to.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ],
        )?;
        Ok(body.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transactions_body_decodes_both_wire_shapes() {
        let bare = r#"[{"transactionId":1,"categoryId":2,"type":"expense","amount":5.0,"transactionDate":"2025-01-02"}]"#;
        let paged = format!(r#"{{"transactions":{bare}}}"#);

        let a: TransactionsBody = serde_json::from_str(bare).unwrap();
        let b: TransactionsBody = serde_json::from_str(&paged).unwrap();
        for body in [a, b] {
            let txs = match body {
                TransactionsBody::Paged { transactions } => transactions,
                TransactionsBody::Bare(transactions) => transactions,
            };
            assert_eq!(txs.len(), 1);
            assert_eq!(txs[0].transaction_id, 1);
        }
    }

    #[test]
    fn error_body_message_is_optional() {
        let with: ErrorBody = serde_json::from_str(r#"{"message":"nope"}"#).unwrap();
        assert_eq!(with.message.as_deref(), Some("nope"));
        let without: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(without.message.is_none());
    }
}
