//! # Tally Service Runner
//!
//! Loads the configuration, opens the database, starts the ledger service
//! and keeps it running until Ctrl-C.
//!
//! ## Usage
//! ```bash
//! # Config from the platform config dir, overridden by TALLY_* variables
//! cargo run -p tally-ledger --bin tally
//!
//! # Explicit config file
//! cargo run -p tally-ledger --bin tally -- --config ./tally.toml
//! ```

use std::env;
use std::path::PathBuf;

use tracing::info;

use tally_db::Database;
use tally_ledger::{init_tracing, LedgerConfig, LedgerService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Ledger Service");
                println!();
                println!("Usage: tally [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let config = LedgerConfig::load(config_path)?;
    info!(db_path = %config.database.path.display(), "Configuration loaded");

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config()).await?;
    let service = LedgerService::start(db.clone(), config).await?;

    let snapshot = service.snapshot().await;
    let pending = snapshot.consumptions.iter().filter(|c| c.is_pending()).count();
    info!(
        products = snapshot.products.len(),
        companies = snapshot.companies.len(),
        employees = snapshot.employees.len(),
        pending_entries = pending,
        pending_total = %service.total_pending_amount().await,
        "Ledger ready"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    service.shutdown().await;
    db.close().await;
    Ok(())
}
