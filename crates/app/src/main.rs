//! Rollcall - attendance recording for multi-hall events
//!
//! Command line front end over `rollcall-core`. Results are printed as
//! pretty JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rollcall_core::{AccessScope, Database, RollcallConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod commands;

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(about = "Record attendance and reconcile course rosters")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "ROLLCALL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(long, global = true, env = "ROLLCALL_DATABASE", value_name = "FILE")]
    database: Option<PathBuf>,

    /// Act as staff of this event instead of as an administrator
    #[arg(long, global = true, value_name = "EVENT_ID")]
    staff_event: Option<Uuid>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RollcallConfig::load_from(path),
        None => RollcallConfig::load(),
    }
    .context("Failed to load configuration")?;

    let db_path = match cli.database {
        Some(path) => path,
        None => config.database_path()?,
    };
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tracing::debug!(path = %db_path.display(), "Opening database");
    let db = Database::open_with_timeout(&db_path, config.busy_timeout())
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let scope = match cli.staff_event {
        Some(event_id) => AccessScope::staff(event_id),
        None => AccessScope::Administrator,
    };

    let output = commands::execute(&db, &scope, config.synonym_tables(), cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
