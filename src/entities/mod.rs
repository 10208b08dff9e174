// Entity Models & Services
//
// Each entity module holds:
// - the row type returned to callers (serialized as JSON)
// - the request payload type, validated by presence
// - free functions over an explicit `&Connection` (list / get / insert / update / delete)

pub mod account;
pub mod category;
pub mod transaction;

pub use account::{Account, AccountInput, NewAccount};
pub use category::{Category, CategoryInput, NewCategory};
pub use transaction::{NewTransaction, Transaction, TransactionFilter, TransactionInput};

use crate::error::{Result, TrackerError};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TRANSACTION KIND
// ============================================================================

/// Direction of money flow. Also used as the kind of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in
    Income,

    /// Money going out
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Table holding records of this kind
    pub fn table(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expenses",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" | "expenses" => Ok(TransactionKind::Expense),
            other => Err(TrackerError::validation(format!(
                "Invalid kind '{}': expected 'income' or 'expense'",
                other
            ))),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse().map_err(|e: TrackerError| FromSqlError::Other(Box::new(e)))
    }
}

// ============================================================================
// PAYLOAD HELPERS
// ============================================================================

/// Numeric payload field: forms post numbers either as JSON numbers or strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    pub fn as_amount(&self, field: &str) -> Result<f64> {
        let value = match self {
            NumericInput::Number(n) => *n,
            NumericInput::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                TrackerError::validation(format!("Field '{}' is not a number: '{}'", field, s))
            })?,
        };

        if !value.is_finite() {
            return Err(TrackerError::validation(format!(
                "Field '{}' is not a finite number",
                field
            )));
        }

        Ok(value)
    }

    pub fn as_id(&self, field: &str) -> Result<i64> {
        match self {
            NumericInput::Number(n)
                if n.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(n) =>
            {
                Ok(*n as i64)
            }
            NumericInput::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                TrackerError::validation(format!("Field '{}' is not an id: '{}'", field, s))
            }),
            NumericInput::Number(n) => Err(TrackerError::validation(format!(
                "Field '{}' is not an id: {}",
                field, n
            ))),
        }
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        NumericInput::Number(value as f64)
    }
}

/// Presence check for text fields (blank counts as missing)
pub(crate) fn required_text(
    value: &Option<String>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => {
            missing.push(field);
            None
        }
    }
}

/// Presence check for any other field
pub(crate) fn required<'a, T>(
    value: &'a Option<T>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<&'a T> {
    if value.is_none() {
        missing.push(field);
    }
    value.as_ref()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        TrackerError::validation(format!(
            "Field '{}' must be a date in YYYY-MM-DD format, got '{}'",
            field, value
        ))
    })
}
