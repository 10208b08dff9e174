// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use finance_tracker::config::StorageConfig;
use finance_tracker::{logging, open_database, reports, verify_counts};
use rusqlite::Connection;

#[derive(Debug, Parser)]
#[command(name = "finance-tracker", version, about = "Personal finance tracker")]
struct Cli {
    #[command(flatten)]
    storage: StorageConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database schema and print table counts
    Init,
    /// Print the dashboard numbers and every account balance
    Summary,
    /// Open the terminal dashboard (default)
    Ui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Ui) {
        Command::Init => {
            logging::init_tracing("finance_tracker=warn");
            run_init(&cli.storage)
        }
        Command::Summary => {
            logging::init_tracing("finance_tracker=warn");
            run_summary(&cli.storage)
        }
        Command::Ui => run_ui_mode(&cli.storage),
    }
}

fn open(storage: &StorageConfig) -> Result<Connection> {
    open_database(&storage.database)
        .with_context(|| format!("Failed to open database at {}", storage.database.display()))
}

fn run_init(storage: &StorageConfig) -> Result<()> {
    let conn = open(storage)?;
    let counts = verify_counts(&conn)?;

    println!("✓ Database ready at {}", storage.database.display());
    println!("  accounts:   {}", counts.accounts);
    println!("  categories: {}", counts.categories);
    println!("  income:     {}", counts.income);
    println!("  expenses:   {}", counts.expenses);

    Ok(())
}

fn run_summary(storage: &StorageConfig) -> Result<()> {
    let conn = open(storage)?;
    let today = Local::now().date_naive();
    let dashboard = reports::dashboard(&conn, today)?;
    let balances = reports::account_balances(&conn)?;

    println!("Summary for {}", today);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total balance:       {:>12.2}", dashboard.total_balance);
    println!("Income this month:   {:>12.2}", dashboard.month_income);
    println!("Expenses this month: {:>12.2}", dashboard.month_expense);

    match &dashboard.last_expense {
        Some(tx) => println!("Last expense:        {} {} ({:.2})", tx.date, tx.description, tx.amount),
        None => println!("Last expense:        none"),
    }

    if !balances.is_empty() {
        println!("\nAccounts");
        for account in &balances {
            println!(
                "  {:<24} {:<12} {:>12.2}",
                account.name, account.account_type, account.balance
            );
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(storage: &StorageConfig) -> Result<()> {
    let conn = open(storage)?;
    let mut app = ui::App::load(&conn, Local::now().date_naive())?;
    ui::run_ui(&mut app, &conn)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_storage: &StorageConfig) -> Result<()> {
    println!("Terminal dashboard not available. Build with --features tui");
    println!("Available commands: init, summary");
    Ok(())
}
