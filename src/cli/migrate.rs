//! `migrate` subcommand: apply pending schema migrations and exit.

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::db::Database;

/// Arguments for the migrate command.
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Only report the current schema version.
    #[arg(long)]
    pub status: bool,
}

/// Run the migrate command against the configured database.
pub fn run_migrate(config: &Config, args: &MigrateArgs) -> Result<()> {
    config.ensure_db_dir()?;
    // Opening the database applies any pending migrations
    let db = Database::open(&config.server.db_path)?;
    let version = db.schema_version()?;

    let verb = if args.status { "is at" } else { "migrated to" };
    match version {
        Some(v) => println!(
            "Database {} {} schema version {}",
            config.server.db_path.display(),
            verb,
            v
        ),
        None => println!(
            "Database {} has no applied migrations",
            config.server.db_path.display()
        ),
    }
    Ok(())
}
