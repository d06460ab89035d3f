//! Write the tickets matching a filter to a CSV file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use tickdash_core::{
    export_to_path, load_config, validate_config, SqliteTicketStore, TicketFilter,
    TicketQueryService, ALL_STATUSES, DEFAULT_EXPORT_FILE,
};
use tickdash_server::init_tracing;

#[derive(Parser)]
#[command(name = "tickdash-export", about = "Export filtered tickets to CSV")]
struct Args {
    /// Configuration file (database path and query settings)
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    /// Free text matched against description and ticket number
    #[arg(long, default_value = "")]
    search: String,
    /// Status selector, e.g. "Pending" or "All"
    #[arg(long, default_value = ALL_STATUSES)]
    status: String,
    /// Destination file
    #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
    output: PathBuf,
}

fn main() {
    if let Err(e) = run() {
        error!("Export failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    let store = SqliteTicketStore::open(&config.database.path)
        .context("Failed to open ticket database")?;
    let service =
        TicketQueryService::new(Arc::new(store)).with_stats_policy(config.query.stats_policy);

    let filter = TicketFilter::new(args.search, args.status);
    export_to_path(&service, &filter, &args.output)
        .with_context(|| format!("Failed to export tickets to {:?}", args.output))?;

    Ok(())
}
