// Finance Tracker - Web Server
// JSON API + web dashboard with Axum

use anyhow::{Context, Result};
use clap::Parser;
use finance_tracker::api::{self, AppState};
use finance_tracker::config::ServerConfig;
use finance_tracker::{logging, open_database};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    logging::init_tracing("finance_tracker=info,tower_http=info");

    let conn = open_database(&config.storage.database).with_context(|| {
        format!("Failed to open database at {}", config.storage.database.display())
    })?;
    tracing::info!(database = %config.storage.database.display(), "database ready");

    let state = AppState::new(conn);
    let app = api::app(state, &config.web_dir);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "server running on http://{} (API under /api, dashboard at /)",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
