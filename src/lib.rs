// Finance Tracker - Core Library
// Exposes all modules for use in the CLI, the terminal dashboard, the API server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod reports;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use db::{open_database, setup_database, verify_counts, SharedConnection, TableCounts};
pub use entities::{
    Account, AccountInput, Category, CategoryInput, NewAccount, NewCategory, NewTransaction,
    Transaction, TransactionFilter, TransactionInput, TransactionKind,
};
pub use error::{Result, TrackerError};
pub use reports::{
    AccountBalance, ChartPoint, ChartSeries, Charts, Dashboard, DateRange, MonthComparison,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
