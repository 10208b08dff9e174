// Process configuration: command-line flags with environment fallbacks

use clap::{Args, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Where the SQLite database lives
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Path to the SQLite database file (created on first use)
    #[arg(short, long, env = "FINANCE_DB", default_value = "finance.db")]
    pub database: PathBuf,
}

/// Settings for the HTTP API server
#[derive(Debug, Clone, Parser)]
#[command(name = "finance-server", version, about = "Personal finance tracker - JSON API and web dashboard")]
pub struct ServerConfig {
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Address to listen on
    #[arg(short, long, env = "FINANCE_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Directory with the static web dashboard assets
    #[arg(long, env = "FINANCE_WEB_DIR", default_value = "web")]
    pub web_dir: PathBuf,
}
