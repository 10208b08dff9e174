// Error types shared by the services, the reporting engine and the API layer

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// Missing or malformed field / query parameter
    #[error("{0}")]
    Validation(String),

    /// Record referenced by id does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Anything the SQLite backend reports (connection, constraint, SQL)
    #[error("{0}")]
    Storage(#[from] rusqlite::Error),

    /// The shared connection mutex was poisoned by a panicking holder
    #[error("database connection is unavailable")]
    LockPoisoned,
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        TrackerError::Validation(message.into())
    }

    /// Missing fields are reported together, in the order they were checked
    pub fn missing_fields(fields: &[&str]) -> Self {
        TrackerError::Validation(format!("Missing required fields: {}", fields.join(", ")))
    }
}
