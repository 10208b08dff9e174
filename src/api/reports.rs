// /api/reports handlers - read-only aggregates

use super::{method_not_allowed, optional_date, query_params, AppState, READ_ONLY};
use crate::entities::transaction::Transaction;
use crate::entities::TransactionKind;
use crate::error::{Result, TrackerError};
use crate::reports::{
    self, AccountBalance, ChartSeries, Charts, Dashboard, DateRange, DEFAULT_MONTHS_BACK,
};
use axum::{
    extract::{rejection::QueryRejection, Json, Query, State},
    Router,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Upper bound for `months` on the series endpoint
const MAX_MONTHS_BACK: u32 = 120;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/statement", method_not_allowed(READ_ONLY).get(statement))
        .route("/dashboard", method_not_allowed(READ_ONLY).get(dashboard))
        .route("/charts", method_not_allowed(READ_ONLY).get(charts))
        .route("/balance", method_not_allowed(READ_ONLY).get(total_balance))
        .route("/accounts", method_not_allowed(READ_ONLY).get(account_balances))
        .route("/monthly", method_not_allowed(READ_ONLY).get(monthly_total))
        .route("/series", method_not_allowed(READ_ONLY).get(monthly_series))
        .route("/breakdown", method_not_allowed(READ_ONLY).get(category_breakdown))
        .route("/last-expense", method_not_allowed(READ_ONLY).get(last_expense))
}

fn parse_kind(kind: Option<&str>) -> Result<TransactionKind> {
    match kind.filter(|k| !k.is_empty()) {
        Some(kind) => kind.parse(),
        None => Ok(TransactionKind::Expense),
    }
}

// ============================================================================
// Statement
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /api/reports/statement?startDate=&endDate= - Income and expenses in range, newest first
pub async fn statement(
    State(state): State<AppState>,
    query: std::result::Result<Query<StatementQuery>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>> {
    let params = query_params(query)?;

    let start = optional_date("startDate", params.start_date.as_deref())?;
    let end = optional_date("endDate", params.end_date.as_deref())?;
    let (Some(start), Some(end)) = (start, end) else {
        return Err(TrackerError::validation("startDate and endDate are required"));
    };

    let transactions = state.run(|conn| reports::transactions_in_range(conn, start, end))?;
    tracing::debug!(%start, %end, count = transactions.len(), "statement generated");

    Ok(Json(transactions))
}

// ============================================================================
// Composite views
// ============================================================================

/// GET /api/reports/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>> {
    let today = state.today();
    Ok(Json(state.run(|conn| reports::dashboard(conn, today))?))
}

/// GET /api/reports/charts
pub async fn charts(State(state): State<AppState>) -> Result<Json<Charts>> {
    let today = state.today();
    Ok(Json(state.run(|conn| reports::charts(conn, today))?))
}

// ============================================================================
// Single aggregates
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub total_balance: f64,
}

/// GET /api/reports/balance
pub async fn total_balance(State(state): State<AppState>) -> Result<Json<BalanceResponse>> {
    let total_balance = state.run(reports::total_balance)?;
    Ok(Json(BalanceResponse { total_balance }))
}

/// GET /api/reports/accounts - Derived balance of every account
pub async fn account_balances(State(state): State<AppState>) -> Result<Json<Vec<AccountBalance>>> {
    Ok(Json(state.run(reports::account_balances)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    pub kind: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyTotalResponse {
    pub kind: TransactionKind,
    pub year: i32,
    pub month: u32,
    pub total: f64,
}

/// GET /api/reports/monthly?kind=&year=&month= - Defaults to expenses of the current month
pub async fn monthly_total(
    State(state): State<AppState>,
    query: std::result::Result<Query<MonthlyQuery>, QueryRejection>,
) -> Result<Json<MonthlyTotalResponse>> {
    let params = query_params(query)?;
    let today = state.today();

    let kind = parse_kind(params.kind.as_deref())?;
    let year = params.year.unwrap_or(today.year());
    let month = params.month.unwrap_or(today.month());

    let total = state.run(|conn| reports::monthly_total(conn, kind, year, month))?;
    Ok(Json(MonthlyTotalResponse {
        kind,
        year,
        month,
        total,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    pub kind: Option<String>,
    pub months: Option<u32>,
}

/// GET /api/reports/series?kind=&months= - Trailing monthly totals, oldest first
pub async fn monthly_series(
    State(state): State<AppState>,
    query: std::result::Result<Query<SeriesQuery>, QueryRejection>,
) -> Result<Json<ChartSeries>> {
    let params = query_params(query)?;
    let kind = parse_kind(params.kind.as_deref())?;
    let months = params.months.unwrap_or(DEFAULT_MONTHS_BACK);

    if months > MAX_MONTHS_BACK {
        return Err(TrackerError::validation(format!(
            "months must be at most {}",
            MAX_MONTHS_BACK
        )));
    }

    let today = state.today();
    Ok(Json(state.run(|conn| reports::monthly_series(conn, kind, months, today))?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownQuery {
    pub kind: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /api/reports/breakdown?kind=&startDate=&endDate= - Defaults to the current month
pub async fn category_breakdown(
    State(state): State<AppState>,
    query: std::result::Result<Query<BreakdownQuery>, QueryRejection>,
) -> Result<Json<ChartSeries>> {
    let params = query_params(query)?;
    let kind = parse_kind(params.kind.as_deref())?;

    let this_month = DateRange::month_of(state.today())?;
    let period = DateRange::new(
        optional_date("startDate", params.start_date.as_deref())?.unwrap_or(this_month.start),
        optional_date("endDate", params.end_date.as_deref())?.unwrap_or(this_month.end),
    );

    Ok(Json(state.run(|conn| reports::category_breakdown(conn, kind, &period))?))
}

/// GET /api/reports/last-expense - `null` when there are no expenses
pub async fn last_expense(State(state): State<AppState>) -> Result<Json<Option<Transaction>>> {
    Ok(Json(state.run(reports::last_expense)?))
}
