// Category Entity - classifies income or expense records, typed by kind
//
// Nothing checks that an expense points at an expense-kind category; the kind
// is only used to filter lists for forms and reports.

use super::{required_text, TransactionKind};
use crate::error::{Result, TrackerError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: TransactionKind,
}

impl Category {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            kind: row.get(2)?,
        })
    }
}

/// Request body for create / update
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: String,
    pub kind: TransactionKind,
}

impl CategoryInput {
    pub fn validate(&self) -> Result<NewCategory> {
        let mut missing = Vec::new();
        let name = required_text(&self.name, "name", &mut missing);
        let kind = required_text(&self.kind, "kind", &mut missing);

        let (Some(name), Some(kind)) = (name, kind) else {
            return Err(TrackerError::missing_fields(&missing));
        };

        Ok(NewCategory {
            name,
            kind: kind.parse()?,
        })
    }
}

/// All categories ordered by name
pub fn get_all_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, kind FROM categories ORDER BY name COLLATE NOCASE, id",
    )?;

    let categories = stmt
        .query_map([], Category::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

/// Categories of one kind, for the income / expense forms
pub fn get_categories_by_kind(conn: &Connection, kind: TransactionKind) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, kind FROM categories WHERE kind = ?1 ORDER BY name COLLATE NOCASE, id",
    )?;

    let categories = stmt
        .query_map([kind], Category::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

pub fn get_category(conn: &Connection, id: i64) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, name, kind FROM categories WHERE id = ?1",
            [id],
            Category::from_row,
        )
        .optional()?;

    Ok(category)
}

pub fn insert_category(conn: &Connection, category: &NewCategory) -> Result<i64> {
    conn.execute(
        "INSERT INTO categories (name, kind) VALUES (?1, ?2)",
        params![category.name, category.kind],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn update_category(conn: &Connection, id: i64, category: &NewCategory) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE categories SET name = ?1, kind = ?2 WHERE id = ?3",
        params![category.name, category.kind, id],
    )?;

    Ok(changed > 0)
}

pub fn delete_category(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM categories WHERE id = ?1", [id])?;
    Ok(removed > 0)
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

    fn new_category(name: &str, kind: TransactionKind) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            kind,
        }
    }

    #[test]
    fn test_create_then_list() {
        let conn = test_conn();
        let id = insert_category(&conn, &new_category("Food", TransactionKind::Expense)).unwrap();

        let categories = get_all_categories(&conn).unwrap();
        assert_eq!(
            categories,
            vec![Category {
                id,
                name: "Food".to_string(),
                kind: TransactionKind::Expense,
            }]
        );
    }

    #[test]
    fn test_filter_by_kind() {
        let conn = test_conn();
        insert_category(&conn, &new_category("Salary", TransactionKind::Income)).unwrap();
        insert_category(&conn, &new_category("Rent", TransactionKind::Expense)).unwrap();
        insert_category(&conn, &new_category("Bonus", TransactionKind::Income)).unwrap();

        let income: Vec<String> = get_categories_by_kind(&conn, TransactionKind::Income)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(income, vec!["Bonus", "Salary"]);

        let expense = get_categories_by_kind(&conn, TransactionKind::Expense).unwrap();
        assert_eq!(expense.len(), 1);
        assert_eq!(expense[0].name, "Rent");
    }

    #[test]
    fn test_update_and_delete() {
        let conn = test_conn();
        let id = insert_category(&conn, &new_category("Misc", TransactionKind::Expense)).unwrap();

        assert!(update_category(&conn, id, &new_category("Gifts", TransactionKind::Income)).unwrap());
        let category = get_category(&conn, id).unwrap().unwrap();
        assert_eq!(category.name, "Gifts");
        assert_eq!(category.kind, TransactionKind::Income);

        assert!(delete_category(&conn, id).unwrap());
        assert!(!delete_category(&conn, id).unwrap());
        assert!(get_all_categories(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_validate_rejects_unknown_kind() {
        let input = CategoryInput {
            name: Some("Transfers".to_string()),
            kind: Some("transfer".to_string()),
        };
        assert!(matches!(input.validate(), Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_validate_missing_fields() {
        let err = CategoryInput::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: name, kind");
    }
}
