use crate::error::{Result, TrackerError};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Connection shared between request handlers
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    tracing::debug!(path = %path.display(), "database opened");
    Ok(conn)
}

pub fn share(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// Run one storage operation while holding the shared connection
pub fn with_connection<T, F>(shared: &SharedConnection, op: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    let conn = shared.lock().map_err(|_| TrackerError::LockPoisoned)?;
    op(&conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // In-memory databases answer "memory" here, which is fine
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Accounts & Categories (independent entities)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            initial_balance REAL NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense'))
        )",
        [],
    )?;

    // ==========================================================================
    // Income & Expenses (same shape, references are advisory - no FK)
    // ==========================================================================
    for table in ["income", "expenses"] {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    description TEXT NOT NULL,
                    amount REAL NOT NULL,
                    category_id INTEGER NOT NULL,
                    account_id INTEGER NOT NULL,
                    date TEXT NOT NULL
                )"
            ),
            [],
        )?;

        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_{table}_date ON {table}(date)"),
            [],
        )?;

        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_{table}_account ON {table}(account_id)"),
            [],
        )?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_categories_kind ON categories(kind)",
        [],
    )?;

    Ok(())
}

/// Row counts per table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableCounts {
    pub accounts: i64,
    pub categories: i64,
    pub income: i64,
    pub expenses: i64,
}

pub fn verify_counts(conn: &Connection) -> Result<TableCounts> {
    let count = |table: &str| -> Result<i64> {
        let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n)
    };

    Ok(TableCounts {
        accounts: count("accounts")?,
        categories: count("categories")?,
        income: count("income")?,
        expenses: count("expenses")?,
    })
}
