//! Kanban API Server
//!
//! A REST service for projects, boards, lists and tasks backed by SQLite.

use anyhow::Result;
use clap::Parser;
use kanban_api::api;
use kanban_api::cli::{Cli, Command, migrate};
use kanban_api::config::{Config, ConfigLoader};
use kanban_api::db::Database;
use kanban_api::logging::{LogOutput, init_logging};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // If explicit config path given, set it as env var for ConfigLoader to pick up
    if let Some(config_path) = &cli.config {
        // SAFETY: nothing else reads the environment concurrently at startup
        unsafe {
            std::env::set_var("KANBAN_CONFIG_PATH", config_path);
        }
    }
    let mut loader = ConfigLoader::load()?;
    let config_path_used = loader.config_path().map(|p| p.display().to_string());

    cli.apply_overrides(loader.config_mut());
    let config = loader.into_config();

    init_logging(
        &LogOutput::parse(&config.logging.output),
        &config.logging.level,
        cli.verbose,
    )?;
    if let Some(path) = config_path_used {
        info!("Config: {}", path);
    }

    match cli.command {
        Some(Command::Migrate(ref args)) => migrate::run_migrate(&config, args),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

/// Run the HTTP server until Ctrl-C.
async fn run_server(config: Config) -> Result<()> {
    config.ensure_db_dir()?;
    let addr = config.bind_addr()?;

    info!("Starting Kanban API v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {:?}", config.server.db_path);

    let db = Arc::new(Database::open(&config.server.db_path)?);
    info!("Database initialized successfully");

    api::serve(db, addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
