//! # Stock Reconciler
//!
//! Derives inventory deltas from ledger mutations. The deltas are staged
//! into the same write batch as the ledger write, so stock and ledger always
//! move together.
//!
//! ## Delta Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Mutation            Delta per product                                  │
//! │  ───────────────     ─────────────────────────────────────────────────  │
//! │  add                 − quantity                                         │
//! │  edit                old quantity − new quantity                        │
//! │  delete              + quantity                                         │
//! │                                                                         │
//! │  Applied as:  stock = max(0, stock + delta)                             │
//! │                                                                         │
//! │  Only ConsumptionLine::Product carries weight; partial-payment and      │
//! │  adjustment lines never reach this module's arithmetic.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ConsumptionLine, Product};

/// Signed stock change per product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockDeltas(BTreeMap<String, i64>);

/// One staged stock update. The store applies it as
/// `stock = max(0, stock + delta)` inside the ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockWrite {
    pub product_id: String,
    pub delta: i64,
}

impl StockDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product_id: &str, delta: i64) {
        let slot = self.0.entry(product_id.to_string()).or_insert(0);
        *slot = slot.saturating_add(delta);
    }

    pub fn get(&self, product_id: &str) -> i64 {
        self.0.get(product_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|delta| *delta == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(id, delta)| (id.as_str(), *delta))
    }

    /// A new sale takes its quantities out of stock.
    pub fn for_sale(lines: &[ConsumptionLine]) -> Self {
        let mut deltas = Self::new();
        for (product_id, quantity) in lines.iter().filter_map(ConsumptionLine::stock_weight) {
            deltas.add(product_id, -quantity);
        }
        deltas
    }

    /// A deleted entry gives its quantities back.
    pub fn for_restore(lines: &[ConsumptionLine]) -> Self {
        let mut deltas = Self::new();
        for (product_id, quantity) in lines.iter().filter_map(ConsumptionLine::stock_weight) {
            deltas.add(product_id, quantity);
        }
        deltas
    }

    /// `old quantity − new quantity` for every product either side touches.
    pub fn for_edit(old: &[ConsumptionLine], new: &[ConsumptionLine]) -> Self {
        let mut deltas = Self::for_restore(old);
        for (product_id, quantity) in new.iter().filter_map(ConsumptionLine::stock_weight) {
            deltas.add(product_id, -quantity);
        }
        deltas
    }

    /// Turns deltas into writes, skipping zero deltas and products that are
    /// no longer in the catalog.
    pub fn stage(&self, catalog: &[Product]) -> Vec<StockWrite> {
        self.iter()
            .filter(|(_, delta)| *delta != 0)
            .filter(|(product_id, _)| catalog.iter().any(|p| p.id == *product_id))
            .map(|(product_id, delta)| StockWrite {
                product_id: product_id.to_string(),
                delta,
            })
            .collect()
    }
}
