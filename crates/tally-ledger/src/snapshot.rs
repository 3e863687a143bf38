//! # Snapshot
//!
//! The service's last-known copy of every store. Projections are computed
//! from a snapshot, never from the database directly.
//!
//! ## Rebuild, Never Patch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  seq = commit_seq()          read BEFORE the data, so the data is at    │
//! │       │                      least as new as the sequence it is tagged  │
//! │       ▼                                                                 │
//! │  products, companies, employees                                         │
//! │  list_pending() ─┐                                                      │
//! │                  ├─► merge_views ─► consumptions (dedup, newest first)  │
//! │  list_dated_within(window) ─┘                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use tally_core::ledger::merge_views;
use tally_core::{Company, Consumption, Employee, Period, Product};
use tally_db::{Database, DbResult};

/// A consistent-enough view of all stores at commit `seq`.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Commit sequence the snapshot is at least as new as.
    pub seq: u64,
    pub products: Vec<Product>,
    pub companies: Vec<Company>,
    pub employees: Vec<Employee>,
    /// Every pending entry plus every entry dated inside `window`.
    pub consumptions: Vec<Consumption>,
    pub window: Period,
}

impl Snapshot {
    /// An empty snapshot at sequence zero, used until the first load.
    pub fn empty(window: Period) -> Self {
        Snapshot {
            seq: 0,
            products: Vec::new(),
            companies: Vec::new(),
            employees: Vec::new(),
            consumptions: Vec::new(),
            window,
        }
    }

    pub async fn load(db: &Database, window: Period) -> DbResult<Self> {
        let seq = db.commit_seq();

        let products = db.products().list_all().await?;
        let companies = db.parties().list_companies().await?;
        let employees = db.parties().list_employees().await?;

        let pending = db.consumptions().list_pending().await?;
        let windowed = db.consumptions().list_dated_within(&window).await?;
        let consumptions = merge_views(pending, windowed);

        debug!(
            seq,
            products = products.len(),
            employees = employees.len(),
            consumptions = consumptions.len(),
            "Snapshot loaded"
        );

        Ok(Snapshot {
            seq,
            products,
            companies,
            employees,
            consumptions,
            window,
        })
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn consumption(&self, id: &str) -> Option<&Consumption> {
        self.consumptions.iter().find(|c| c.id == id)
    }
}
