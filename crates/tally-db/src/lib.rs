//! # tally-db: Database Layer for Tally
//!
//! Persistence for the consumption ledger: an embedded SQLite database
//! accessed with sqlx, multi-record atomic write batches, and a change feed
//! that announces every commit.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally Data Flow                                 │
//! │                                                                         │
//! │  LedgerService (tally-ledger)                                          │
//! │       │ reads            │ commit(batch)          ▲ ChangeNotice        │
//! │       ▼                  ▼                        │                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │  Database   │   │ Repositories │   │   WriteBatch     │   │   │
//! │  │   │  (pool.rs)  │   │ product      │   │   (batch.rs)     │   │   │
//! │  │   │             │◄──│ party        │   │                  │   │   │
//! │  │   │ SqlitePool  │   │ consumption  │   │   ChangeFeed     │   │   │
//! │  │   │ Migrations  │   │ trash        │   │   (feed.rs)      │   │   │
//! │  │   └─────────────┘   └──────────────┘   └──────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, repositories, commits
//! - [`batch`] - Staged writes applied in one transaction
//! - [`feed`] - Change notices
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Read repositories (product, party, consumption, trash)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig, WriteBatch};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//! let mut feed = db.subscribe();
//!
//! let mut batch = WriteBatch::new();
//! batch.insert_consumption(entry).adjust_stock(writes);
//! let seq = db.commit(batch).await?;
//!
//! let notice = feed.recv().await?;
//! assert_eq!(notice.seq, seq);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod error;
pub mod feed;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use batch::{WriteBatch, WriteOp};
pub use error::{DbError, DbResult};
pub use feed::{ChangeNotice, Collection};
pub use pool::{Database, DbConfig};
pub use repository::{now, storable};

// Repository re-exports for convenience
pub use repository::consumption::ConsumptionRepository;
pub use repository::party::PartyRepository;
pub use repository::product::ProductRepository;
pub use repository::trash::TrashRepository;
