//! # tally-core: Pure Ledger Logic for Tally
//!
//! This crate holds the rules of the consumption ledger as pure functions
//! with no I/O dependencies. The database crate persists what these
//! functions produce; the ledger service wires the two together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tally-ledger (LedgerService)                    │   │
//! │  │   add / edit / delete consumption, record / revert payment,    │   │
//! │  │   catalog and party maintenance, projections over a snapshot   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────────┐    │   │
//! │  │   │  ledger  │ │  stock   │ │allocation│ │   projection   │    │   │
//! │  │   │  rules   │ │  deltas  │ │  engine  │ │ totals, ranks  │    │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └────────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO IMPLICIT CLOCK • PURE FUNCTIONS    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │         SQLite repositories, write batches, change feed         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Employee, Consumption, Period, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`ledger`] - Entry construction, edit, settlement and reversal rules
//! - [`stock`] - Stock deltas derived from ledger mutations
//! - [`allocation`] - Oldest-first payment allocation with partial splits
//! - [`projection`] - Balances and period reports
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: the current time is always passed in, never read
//! 2. **Integer Money**: all monetary values are cents (i64)
//! 3. **Typed Lines**: bookkeeping lines are their own variants and carry no stock weight
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::allocation::allocate;
//! use tally_core::types::{Consumption, ConsumptionLine, PaymentMethod};
//! use tally_core::Money;
//! use chrono::{TimeZone, Utc};
//!
//! let day = |d| Utc.with_ymd_and_hms(2026, 10, d, 0, 0, 0).unwrap();
//! let tab = |id: &str, d, cents| Consumption {
//!     id: id.to_string(),
//!     employee_id: "emp-1".to_string(),
//!     date: day(d),
//!     items: vec![ConsumptionLine::product("coxinha", 1, Money::from_cents(cents))],
//!     payment: None,
//! };
//!
//! let ledger = vec![tab("con-1", 1, 1000), tab("con-2", 2, 1500)];
//! let result = allocate(&ledger, "emp-1", Money::from_cents(1200), PaymentMethod::Pix, day(10), "con-3");
//!
//! assert_eq!(result.fully_settled.len(), 1);
//! assert_eq!(result.carve_out.unwrap().total().cents(), 200);
//! assert_eq!(result.adjusted_source.unwrap().total().cents(), 1300);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod error;
pub mod ledger;
pub mod money;
pub mod projection;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{ConsumptionDraft, PartialReversalPolicy};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Reason recorded on trash records written by a delete.
pub const TRASH_REASON_DELETED: &str = "deleted";

/// Default length of the reporting window, in days.
///
/// ## Business Reason
/// The dashboard and the employee screens look at the current and previous
/// month; settled entries older than that only matter for archives.
pub const DEFAULT_WINDOW_DAYS: u32 = 62;
