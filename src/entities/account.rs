// Account Entity - a named money container with a starting balance
//
// The current balance is never stored: it is derived by the reporting engine
// from the initial balance plus linked income minus linked expenses.

use super::{required, required_text, NumericInput};
use crate::error::{Result, TrackerError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

// ============================================================================
// ACCOUNT ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,

    pub name: String,

    /// Free-text label ("checking", "wallet", "savings", ...)
    #[serde(rename = "type")]
    pub account_type: String,

    pub initial_balance: f64,
}

impl Account {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Account {
            id: row.get(0)?,
            name: row.get(1)?,
            account_type: row.get(2)?,
            initial_balance: row.get(3)?,
        })
    }
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// Request body for create / update
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AccountInput {
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub account_type: Option<String>,

    pub initial_balance: Option<NumericInput>,
}

/// Validated account fields
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub account_type: String,
    pub initial_balance: f64,
}

impl AccountInput {
    pub fn validate(&self) -> Result<NewAccount> {
        let mut missing = Vec::new();
        let name = required_text(&self.name, "name", &mut missing);
        let account_type = required_text(&self.account_type, "type", &mut missing);
        let initial_balance = required(&self.initial_balance, "initial_balance", &mut missing);

        let (Some(name), Some(account_type), Some(initial_balance)) =
            (name, account_type, initial_balance)
        else {
            return Err(TrackerError::missing_fields(&missing));
        };

        Ok(NewAccount {
            name,
            account_type,
            initial_balance: initial_balance.as_amount("initial_balance")?,
        })
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// All accounts ordered by name
pub fn get_all_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, type, initial_balance
         FROM accounts
         ORDER BY name COLLATE NOCASE, id",
    )?;

    let accounts = stmt
        .query_map([], Account::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(accounts)
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            "SELECT id, name, type, initial_balance FROM accounts WHERE id = ?1",
            [id],
            Account::from_row,
        )
        .optional()?;

    Ok(account)
}

/// Insert a new account, returning its id
pub fn insert_account(conn: &Connection, account: &NewAccount) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts (name, type, initial_balance) VALUES (?1, ?2, ?3)",
        params![account.name, account.account_type, account.initial_balance],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Overwrite every field; returns false when no row has that id
pub fn update_account(conn: &Connection, id: i64, account: &NewAccount) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE accounts SET name = ?1, type = ?2, initial_balance = ?3 WHERE id = ?4",
        params![account.name, account.account_type, account.initial_balance, id],
    )?;

    Ok(changed > 0)
}

/// Remove the account if present. Income/expense rows pointing at it are left as they are.
pub fn delete_account(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
    Ok(removed > 0)
}

/// Copy an account into a new row named "<name> (Copy)", returning the new id
pub fn duplicate_account(conn: &Connection, id: i64) -> Result<i64> {
    let source = get_account(conn, id)?.ok_or(TrackerError::NotFound {
        entity: "account",
        id,
    })?;

    insert_account(
        conn,
        &NewAccount {
            name: format!("{} (Copy)", source.name),
            account_type: source.account_type,
            initial_balance: source.initial_balance,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn new_account(name: &str, balance: f64) -> NewAccount {
        NewAccount {
            name: name.to_string(),
            account_type: "checking".to_string(),
            initial_balance: balance,
        }
    }

    #[test]
    fn test_create_then_list_includes_account() {
        let conn = test_conn();
        let id = insert_account(&conn, &new_account("Nubank", 250.75)).unwrap();

        let accounts = get_all_accounts(&conn).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].id, id);
        assert_eq!(accounts[0].name, "Nubank");
        assert_eq!(accounts[0].account_type, "checking");
        assert_eq!(accounts[0].initial_balance, 250.75);
    }

    #[test]
    fn test_list_ordered_by_name() {
        let conn = test_conn();
        insert_account(&conn, &new_account("wallet", 0.0)).unwrap();
        insert_account(&conn, &new_account("Bank", 0.0)).unwrap();
        insert_account(&conn, &new_account("Savings", 0.0)).unwrap();

        let names: Vec<String> = get_all_accounts(&conn)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Bank", "Savings", "wallet"]);
    }

    #[test]
    fn test_update_account() {
        let conn = test_conn();
        let id = insert_account(&conn, &new_account("Old", 10.0)).unwrap();

        let changed = update_account(&conn, id, &new_account("New", 20.0)).unwrap();
        assert!(changed);

        let account = get_account(&conn, id).unwrap().unwrap();
        assert_eq!(account.name, "New");
        assert_eq!(account.initial_balance, 20.0);
    }

    #[test]
    fn test_update_missing_account_is_noop() {
        let conn = test_conn();
        let changed = update_account(&conn, 99, &new_account("Ghost", 1.0)).unwrap();
        assert!(!changed);
        assert!(get_all_accounts(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let conn = test_conn();
        let id = insert_account(&conn, &new_account("Temp", 0.0)).unwrap();

        assert!(delete_account(&conn, id).unwrap());
        assert!(!delete_account(&conn, id).unwrap());
        assert!(get_account(&conn, id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_account() {
        let conn = test_conn();
        let id = insert_account(&conn, &new_account("Nubank", 42.5)).unwrap();

        let copy_id = duplicate_account(&conn, id).unwrap();
        assert_ne!(copy_id, id);

        let copy = get_account(&conn, copy_id).unwrap().unwrap();
        assert_eq!(copy.name, "Nubank (Copy)");
        assert_eq!(copy.account_type, "checking");
        assert_eq!(copy.initial_balance, 42.5);
        assert_eq!(get_all_accounts(&conn).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_missing_account() {
        let conn = test_conn();
        let err = duplicate_account(&conn, 7).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { entity: "account", id: 7 }));
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let input = AccountInput {
            name: Some("Wallet".to_string()),
            ..Default::default()
        };

        let err = input.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: type, initial_balance"
        );
    }

    #[test]
    fn test_validate_accepts_string_balance() {
        let input: AccountInput = serde_json::from_value(serde_json::json!({
            "name": "Wallet",
            "type": "cash",
            "initial_balance": "100.50"
        }))
        .unwrap();

        let account = input.validate().unwrap();
        assert_eq!(account.initial_balance, 100.5);
        assert_eq!(account.account_type, "cash");
    }

    #[test]
    fn test_account_serializes_type_field() {
        let account = Account {
            id: 1,
            name: "Wallet".to_string(),
            account_type: "cash".to_string(),
            initial_balance: 5.0,
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["type"], "cash");
        assert_eq!(json["initial_balance"], 5.0);
    }
}
