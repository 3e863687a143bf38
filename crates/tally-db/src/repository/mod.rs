//! # Repository Module
//!
//! Read-side repositories for Tally. Every write goes through a
//! [`WriteBatch`](crate::batch::WriteBatch) instead, so that one caller
//! operation is always one transaction and one change notice.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  LedgerService                                                          │
//! │       │                                                                 │
//! │       ├── reads ──► db.products() / db.parties() / db.consumptions()    │
//! │       │                 │                                               │
//! │       │                 ▼                                               │
//! │       │             SELECT ... → FromRow row → domain type              │
//! │       │                                                                 │
//! │       └── writes ─► db.commit(WriteBatch) → one transaction             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads
//! - [`PartyRepository`](party::PartyRepository) - Companies and employees
//! - [`ConsumptionRepository`](consumption::ConsumptionRepository) - Ledger queries
//! - [`TrashRepository`](trash::TrashRepository) - Deleted entry mirror

pub mod consumption;
pub mod party;
pub mod product;
pub mod trash;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::{DbError, DbResult};

/// Instants are stored as fixed-width RFC 3339 text with millisecond
/// precision, e.g. `2026-10-16T09:30:00.000Z`.
pub fn encode_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_instant(text: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidData(format!("bad timestamp '{}': {}", text, e)))
}

/// Truncates to the precision the store keeps, so values handed back to
/// callers compare equal to what a later read returns.
pub fn storable(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(3)
}

/// Current instant at store precision.
pub fn now() -> DateTime<Utc> {
    storable(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_instant_encoding_is_fixed_width_and_ordered() {
        let early = Utc.with_ymd_and_hms(2026, 9, 30, 23, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();

        let a = encode_instant(early);
        let b = encode_instant(late);
        assert_eq!(a, "2026-09-30T23:59:59.000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(decode_instant(&b).unwrap(), late);
    }

    #[test]
    fn test_storable_round_trips() {
        let t = now();
        assert_eq!(decode_instant(&encode_instant(t)).unwrap(), t);
        assert!(decode_instant("yesterday").is_err());
    }
}
