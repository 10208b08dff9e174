// 📊 Reporting Engine - read-only aggregates over the four tables
//
// Every function re-queries storage: no caching, no writes. Functions that
// depend on "today" take it as a parameter so callers (and tests) pin the clock.
// Results are shaped as explicit ordered (label, value) series, independent of
// whatever chart library ends up drawing them.

use crate::entities::transaction::Transaction;
use crate::entities::TransactionKind;
use crate::error::{Result, TrackerError};
use chrono::{Datelike, Months, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trailing window used by the dashboard and chart views
pub const DEFAULT_MONTHS_BACK: u32 = 6;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const UNCATEGORIZED: &str = "Uncategorized";

// ============================================================================
// CHART SHAPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Ordered sequence of (label, value) pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn new(name: impl Into<String>) -> Self {
        ChartSeries {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.points.push(ChartPoint {
            label: label.into(),
            value: round_cents(value),
        });
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.points.iter().find(|p| p.label == label).map(|p| p.value)
    }

    pub fn total(&self) -> f64 {
        round_cents(self.points.iter().map(|p| p.value).sum())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Income and expense totals for one month, side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub label: String,
    pub income: f64,
    pub expense: f64,
}

/// Account with its derived current balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub initial_balance: f64,
    pub balance: f64,
}

// ============================================================================
// PERIODS
// ============================================================================

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Whole calendar month
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            TrackerError::validation(format!("Invalid month: {}-{:02}", year, month))
        })?;
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| TrackerError::validation(format!("Month out of range: {}", year)))?;

        Ok(DateRange { start, end })
    }

    /// Calendar month containing `day`
    pub fn month_of(day: NaiveDate) -> Result<Self> {
        Self::month(day.year(), day.month())
    }

    /// From one month before `today` up to `today`
    pub fn trailing_month(today: NaiveDate) -> Self {
        let start = today.checked_sub_months(Months::new(1)).unwrap_or(NaiveDate::MIN);
        DateRange { start, end: today }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// "Jan/25" style label
pub fn month_label(year: i32, month: u32) -> String {
    let name = MONTH_ABBREVIATIONS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("???");
    format!("{}/{:02}", name, year.rem_euclid(100))
}

/// (year, month) pairs of the trailing window ending at `today`'s month, oldest first
fn months_window(today: NaiveDate, months_back: u32) -> Vec<(i32, u32)> {
    let current = today.year() * 12 + today.month0() as i32;

    (0..months_back as i32)
        .rev()
        .map(|offset| {
            let index = current - offset;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// TOTALS
// ============================================================================

/// Σ initial balances + Σ income − Σ expenses. Empty tables count as zero.
pub fn total_balance(conn: &Connection) -> Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT
            (SELECT COALESCE(SUM(initial_balance), 0.0) FROM accounts) +
            (SELECT COALESCE(SUM(amount), 0.0) FROM income) -
            (SELECT COALESCE(SUM(amount), 0.0) FROM expenses)",
        [],
        |row| row.get(0),
    )?;

    Ok(round_cents(total))
}

pub fn monthly_total(conn: &Connection, kind: TransactionKind, year: i32, month: u32) -> Result<f64> {
    let period = DateRange::month(year, month)?;
    period_total(conn, kind, &period)
}

fn period_total(conn: &Connection, kind: TransactionKind, period: &DateRange) -> Result<f64> {
    let total: f64 = conn.query_row(
        &format!(
            "SELECT COALESCE(SUM(amount), 0.0) FROM {} WHERE date >= ?1 AND date <= ?2",
            kind.table()
        ),
        params![period.start, period.end],
        |row| row.get(0),
    )?;

    Ok(round_cents(total))
}

/// Most recent expense; same-day ties go to the highest id
pub fn last_expense(conn: &Connection) -> Result<Option<Transaction>> {
    let kind = TransactionKind::Expense;
    let expense = conn
        .query_row(
            "SELECT t.id, t.description, t.amount, t.category_id, t.account_id, t.date,
                    c.name, a.name
             FROM expenses t
             LEFT JOIN categories c ON t.category_id = c.id
             LEFT JOIN accounts a ON t.account_id = a.id
             ORDER BY t.date DESC, t.id DESC
             LIMIT 1",
            [],
            |row| Transaction::from_row(kind, row),
        )
        .optional()?;

    Ok(expense)
}

// ============================================================================
// GROUPINGS
// ============================================================================

fn monthly_sums(
    conn: &Connection,
    kind: TransactionKind,
    today: NaiveDate,
    months_back: u32,
) -> Result<(Vec<(i32, u32)>, HashMap<String, f64>)> {
    let window = months_window(today, months_back);
    let (Some(&(first_year, first_month)), Some(&(last_year, last_month))) =
        (window.first(), window.last())
    else {
        return Ok((window, HashMap::new()));
    };

    let start = DateRange::month(first_year, first_month)?.start;
    let end = DateRange::month(last_year, last_month)?.end;

    let mut stmt = conn.prepare(&format!(
        "SELECT strftime('%Y-%m', date) AS month, SUM(amount)
         FROM {}
         WHERE date >= ?1 AND date <= ?2
         GROUP BY month",
        kind.table()
    ))?;

    let sums = stmt
        .query_map(params![start, end], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;

    Ok((window, sums))
}

/// One entry per month of the trailing window, oldest first; empty months are 0
pub fn monthly_series(
    conn: &Connection,
    kind: TransactionKind,
    months_back: u32,
    today: NaiveDate,
) -> Result<ChartSeries> {
    let (window, sums) = monthly_sums(conn, kind, today, months_back)?;

    let mut series = ChartSeries::new(format!("{} per month", kind.title()));
    for (year, month) in window {
        let key = format!("{:04}-{:02}", year, month);
        series.push(month_label(year, month), sums.get(&key).copied().unwrap_or(0.0));
    }

    Ok(series)
}

/// Income next to expense for each month of the trailing window
pub fn revenue_vs_expense(
    conn: &Connection,
    months_back: u32,
    today: NaiveDate,
) -> Result<Vec<MonthComparison>> {
    let income = monthly_series(conn, TransactionKind::Income, months_back, today)?;
    let expense = monthly_series(conn, TransactionKind::Expense, months_back, today)?;

    Ok(income
        .points
        .into_iter()
        .zip(expense.points)
        .map(|(i, e)| MonthComparison {
            label: i.label,
            income: i.value,
            expense: e.value,
        })
        .collect())
}

/// Σ amount per category name within the period, largest first
pub fn category_breakdown(
    conn: &Connection,
    kind: TransactionKind,
    period: &DateRange,
) -> Result<ChartSeries> {
    let mut stmt = conn.prepare(&format!(
        "SELECT COALESCE(c.name, '{UNCATEGORIZED}') AS category, SUM(t.amount) AS total
         FROM {} t
         LEFT JOIN categories c ON t.category_id = c.id
         WHERE t.date >= ?1 AND t.date <= ?2
         GROUP BY category
         ORDER BY total DESC, category",
        kind.table()
    ))?;

    let rows = stmt
        .query_map(params![period.start, period.end], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut series = ChartSeries::new(format!("{} by category", kind.title()));
    for (category, total) in rows {
        series.push(category, total);
    }

    Ok(series)
}

/// Every account with initial balance + linked income − linked expenses
pub fn account_balances(conn: &Connection) -> Result<Vec<AccountBalance>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, a.type, a.initial_balance,
                a.initial_balance
                  + COALESCE((SELECT SUM(i.amount) FROM income i WHERE i.account_id = a.id), 0.0)
                  - COALESCE((SELECT SUM(e.amount) FROM expenses e WHERE e.account_id = a.id), 0.0)
         FROM accounts a
         ORDER BY a.name COLLATE NOCASE, a.id",
    )?;

    let balances = stmt
        .query_map([], |row| {
            Ok(AccountBalance {
                id: row.get(0)?,
                name: row.get(1)?,
                account_type: row.get(2)?,
                initial_balance: row.get(3)?,
                balance: round_cents(row.get(4)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(balances)
}

pub fn account_balance_series(balances: &[AccountBalance]) -> ChartSeries {
    let mut series = ChartSeries::new("Current balance per account");
    for account in balances {
        series.push(account.name.clone(), account.balance);
    }
    series
}

// ============================================================================
// STATEMENT
// ============================================================================

/// Income and expenses dated within [start, end], merged, newest first
pub fn transactions_in_range(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Transaction>> {
    let select = |kind: TransactionKind| {
        format!(
            "SELECT t.id AS id, t.description, t.amount, t.category_id, t.account_id,
                    t.date AS date, c.name, a.name, '{}' AS kind
             FROM {} t
             LEFT JOIN categories c ON t.category_id = c.id
             LEFT JOIN accounts a ON t.account_id = a.id
             WHERE t.date >= ?1 AND t.date <= ?2",
            kind.as_str(),
            kind.table()
        )
    };

    let sql = format!(
        "{} UNION ALL {} ORDER BY date DESC, id DESC, kind DESC",
        select(TransactionKind::Income),
        select(TransactionKind::Expense)
    );

    let mut stmt = conn.prepare(&sql)?;
    let transactions = stmt
        .query_map(params![start, end], |row| {
            let kind: TransactionKind = row.get(8)?;
            Transaction::from_row(kind, row)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(transactions)
}

// ============================================================================
// COMPOSITE VIEWS
// ============================================================================

/// Home page numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_balance: f64,
    pub month_income: f64,
    pub month_expense: f64,
    pub last_expense: Option<Transaction>,
    pub expense_series: ChartSeries,
    pub expense_breakdown: ChartSeries,
}

pub fn dashboard(conn: &Connection, today: NaiveDate) -> Result<Dashboard> {
    Ok(Dashboard {
        total_balance: total_balance(conn)?,
        month_income: monthly_total(conn, TransactionKind::Income, today.year(), today.month())?,
        month_expense: monthly_total(conn, TransactionKind::Expense, today.year(), today.month())?,
        last_expense: last_expense(conn)?,
        expense_series: monthly_series(conn, TransactionKind::Expense, DEFAULT_MONTHS_BACK, today)?,
        expense_breakdown: category_breakdown(
            conn,
            TransactionKind::Expense,
            &DateRange::trailing_month(today),
        )?,
    })
}

/// Reports page charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charts {
    pub account_balances: ChartSeries,
    pub revenue_vs_expense: Vec<MonthComparison>,
    pub income_by_category: ChartSeries,
    pub expense_by_category: ChartSeries,
}

pub fn charts(conn: &Connection, today: NaiveDate) -> Result<Charts> {
    let this_month = DateRange::month_of(today)?;

    Ok(Charts {
        account_balances: account_balance_series(&account_balances(conn)?),
        revenue_vs_expense: revenue_vs_expense(conn, DEFAULT_MONTHS_BACK, today)?,
        income_by_category: category_breakdown(conn, TransactionKind::Income, &this_month)?,
        expense_by_category: category_breakdown(conn, TransactionKind::Expense, &this_month)?,
    })
}
