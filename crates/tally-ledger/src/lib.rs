//! # tally-ledger: Ledger Service for Tally
//!
//! The caller-facing layer of the consumption ledger. [`LedgerService`] owns
//! the database handle, stages every mutation as one atomic write batch and
//! keeps a read-through [`Snapshot`] that the projections are computed from.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  caller (UI, CLI)                                                       │
//! │       │ async ops → LedgerResult<_>                                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  tally-ledger (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │  LedgerService ──► tally-core rules ──► WriteBatch              │   │
//! │  │       ▲                                     │                   │   │
//! │  │       │ rebuild                             ▼                   │   │
//! │  │  Snapshot ◄── watcher ◄── ChangeNotice ◄── tally-db commit      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_ledger::{LedgerConfig, LedgerService};
//! use tally_db::Database;
//!
//! let config = LedgerConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//! let service = LedgerService::start(db, config).await?;
//!
//! let settled = service
//!     .record_payment(&employee_id, Money::parse("12.00")?, PaymentMethod::Pix)
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod snapshot;

pub use config::{ConfigError, LedgerConfig};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use service::LedgerService;
pub use snapshot::Snapshot;

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// Default filter: `info,tally=debug,sqlx=warn`, overridable with `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
