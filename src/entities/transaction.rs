// Income & Expense Entities - dated money movements tied to one account and one category
//
// Both live in their own table with an identical shape, so one set of service
// functions serves both, parameterized by `TransactionKind`.

use super::{parse_date, required, required_text, NumericInput, TransactionKind};
use crate::error::{Result, TrackerError};
use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

// ============================================================================
// TRANSACTION ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    pub description: String,
    pub amount: f64,
    pub category_id: i64,
    pub account_id: i64,
    pub date: NaiveDate,

    /// Resolved through the category reference (None when it dangles)
    pub category_name: Option<String>,

    /// Resolved through the account reference (None when the account was deleted)
    pub account_name: Option<String>,
}

impl Transaction {
    pub(crate) fn from_row(kind: TransactionKind, row: &Row) -> rusqlite::Result<Self> {
        Ok(Transaction {
            id: row.get(0)?,
            kind,
            description: row.get(1)?,
            amount: row.get(2)?,
            category_id: row.get(3)?,
            account_id: row.get(4)?,
            date: row.get(5)?,
            category_name: row.get(6)?,
            account_name: row.get(7)?,
        })
    }

    /// Payload fields of this row, e.g. to duplicate it
    pub fn to_new(&self) -> NewTransaction {
        NewTransaction {
            description: self.description.clone(),
            amount: self.amount,
            category_id: self.category_id,
            account_id: self.account_id,
            date: self.date,
        }
    }
}

/// Shared SELECT with the display joins; callers append WHERE / ORDER BY
fn select_sql(kind: TransactionKind) -> String {
    format!(
        "SELECT t.id, t.description, t.amount, t.category_id, t.account_id, t.date,
                c.name, a.name
         FROM {} t
         LEFT JOIN categories c ON t.category_id = c.id
         LEFT JOIN accounts a ON t.account_id = a.id",
        kind.table()
    )
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// Request body for create / update
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransactionInput {
    pub description: Option<String>,
    pub amount: Option<NumericInput>,
    pub category_id: Option<NumericInput>,
    pub account_id: Option<NumericInput>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub category_id: i64,
    pub account_id: i64,
    pub date: NaiveDate,
}

impl TransactionInput {
    pub fn validate(&self) -> Result<NewTransaction> {
        let mut missing = Vec::new();
        let description = required_text(&self.description, "description", &mut missing);
        let amount = required(&self.amount, "amount", &mut missing);
        let category_id = required(&self.category_id, "category_id", &mut missing);
        let account_id = required(&self.account_id, "account_id", &mut missing);
        let date = required_text(&self.date, "date", &mut missing);

        let (Some(description), Some(amount), Some(category_id), Some(account_id), Some(date)) =
            (description, amount, category_id, account_id, date)
        else {
            return Err(TrackerError::missing_fields(&missing));
        };

        Ok(NewTransaction {
            description,
            amount: amount.as_amount("amount")?,
            category_id: category_id.as_id("category_id")?,
            account_id: account_id.as_id("account_id")?,
            date: parse_date("date", &date)?,
        })
    }
}

// ============================================================================
// FILTER
// ============================================================================

/// Optional narrowing for list queries; every bound is inclusive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub account_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        TransactionFilter {
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.account_id.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// All records of a kind, newest first
pub fn get_all_transactions(conn: &Connection, kind: TransactionKind) -> Result<Vec<Transaction>> {
    get_transactions_filtered(conn, kind, &TransactionFilter::default())
}

pub fn get_transactions_filtered(
    conn: &Connection,
    kind: TransactionKind,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(account_id) = filter.account_id {
        clauses.push("t.account_id = ?");
        values.push(Box::new(account_id));
    }
    if let Some(start) = filter.start_date {
        clauses.push("t.date >= ?");
        values.push(Box::new(start));
    }
    if let Some(end) = filter.end_date {
        clauses.push("t.date <= ?");
        values.push(Box::new(end));
    }

    let mut sql = select_sql(kind);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let transactions = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Transaction::from_row(kind, row)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(transactions)
}

pub fn get_transaction(
    conn: &Connection,
    kind: TransactionKind,
    id: i64,
) -> Result<Option<Transaction>> {
    let sql = format!("{} WHERE t.id = ?1", select_sql(kind));
    let transaction = conn
        .query_row(&sql, [id], |row| Transaction::from_row(kind, row))
        .optional()?;

    Ok(transaction)
}

pub fn insert_transaction(
    conn: &Connection,
    kind: TransactionKind,
    tx: &NewTransaction,
) -> Result<i64> {
    conn.execute(
        &format!(
            "INSERT INTO {} (description, amount, category_id, account_id, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            kind.table()
        ),
        params![tx.description, tx.amount, tx.category_id, tx.account_id, tx.date],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn update_transaction(
    conn: &Connection,
    kind: TransactionKind,
    id: i64,
    tx: &NewTransaction,
) -> Result<bool> {
    let changed = conn.execute(
        &format!(
            "UPDATE {} SET description = ?1, amount = ?2, category_id = ?3, account_id = ?4, date = ?5
             WHERE id = ?6",
            kind.table()
        ),
        params![tx.description, tx.amount, tx.category_id, tx.account_id, tx.date, id],
    )?;

    Ok(changed > 0)
}

pub fn delete_transaction(conn: &Connection, kind: TransactionKind, id: i64) -> Result<bool> {
    let removed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), [id])?;
    Ok(removed > 0)
}

/// Copy an existing record into a new row, returning the new id
pub fn duplicate_transaction(conn: &Connection, kind: TransactionKind, id: i64) -> Result<i64> {
    let source = get_transaction(conn, kind, id)?.ok_or(TrackerError::NotFound {
        entity: kind.as_str(),
        id,
    })?;

    insert_transaction(conn, kind, &source.to_new())
}
