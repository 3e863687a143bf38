//! # Ledger Rules
//!
//! Pure construction and transformation of ledger entries. The service layer
//! looks things up, calls into here to get the new entry state, and commits
//! the result together with the stock writes.
//!
//! ## Entry Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  new_entry ──► PENDING ──── settle ────► SETTLED                        │
//! │                  │  ▲                      │                            │
//! │                  │  └──── reopen ──────────┘  (revert payment)          │
//! │                  │                                                      │
//! │                  ├── replace_product_lines (edit, either state)         │
//! │                  └── + Adjustment line (partial payment carve-out)      │
//! │                                                                         │
//! │  delete: any state → trash mirror, removed from the live ledger         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{
    new_entry_id, Consumption, ConsumptionLine, ItemRequest, Payment, PaymentMethod, Product,
};

/// What happens to the adjustment on the original entry when a partial
/// payment carve-out is reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialReversalPolicy {
    /// Delete the carve-out only. The original entry stays reduced by the
    /// adjustment until an operator reverts it separately.
    #[default]
    KeepAdjustment,

    /// Delete the carve-out and remove its paired adjustment in the same
    /// batch, restoring the original entry's pending total.
    RestoreAdjustment,
}

impl std::str::FromStr for PartialReversalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "keep_adjustment" | "keep" => Ok(PartialReversalPolicy::KeepAdjustment),
            "restore_adjustment" | "restore" => Ok(PartialReversalPolicy::RestoreAdjustment),
            other => Err(format!("unknown partial reversal policy '{}'", other)),
        }
    }
}

/// A sale as submitted by a caller, before it is priced.
///
/// The id is generated once when the draft is built and reused on retry, so
/// resubmitting a draft whose first attempt did commit returns the stored
/// entry instead of recording the sale twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionDraft {
    pub id: String,
    pub employee_id: String,
    pub items: Vec<ItemRequest>,
    pub sale_date: DateTime<Utc>,
    /// Settle immediately with this method (walk-in sales).
    pub payment: Option<PaymentMethod>,
}

impl ConsumptionDraft {
    pub fn new(
        employee_id: impl Into<String>,
        items: Vec<ItemRequest>,
        sale_date: DateTime<Utc>,
    ) -> Self {
        ConsumptionDraft {
            id: new_entry_id(),
            employee_id: employee_id.into(),
            items,
            sale_date,
            payment: None,
        }
    }

    pub fn paid_with(mut self, method: PaymentMethod) -> Self {
        self.payment = Some(method);
        self
    }
}

/// Prices requested items from the current catalog.
///
/// ## Snapshot Pattern
/// The catalog price is copied into the line. Later catalog edits never
/// change what an existing entry is worth.
pub fn price_items(items: &[ItemRequest], catalog: &[Product]) -> CoreResult<Vec<ConsumptionLine>> {
    items
        .iter()
        .map(|item| {
            let product = catalog
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or_else(|| CoreError::not_found("Product", &item.product_id))?;
            Ok(ConsumptionLine::product(
                &item.product_id,
                item.quantity,
                product.price,
            ))
        })
        .collect()
}

/// Builds a new entry. With a payment method the entry is created settled,
/// stamped `now` (walk-in sales).
pub fn new_entry(
    id: impl Into<String>,
    employee_id: impl Into<String>,
    lines: Vec<ConsumptionLine>,
    sale_date: DateTime<Utc>,
    payment: Option<PaymentMethod>,
    now: DateTime<Utc>,
) -> Consumption {
    Consumption {
        id: id.into(),
        employee_id: employee_id.into(),
        date: sale_date,
        items: lines,
        payment: payment.map(|method| Payment { date: now, method }),
    }
}

/// Replaces the product lines and the date of an entry.
///
/// Bookkeeping lines already on the entry are carried over so that an edit
/// never silently forgives (or re-charges) an amount that was carved out.
/// Settlement state is left untouched.
pub fn replace_product_lines(
    entry: &Consumption,
    new_lines: Vec<ConsumptionLine>,
    new_date: DateTime<Utc>,
) -> Consumption {
    let mut items = new_lines;
    items.extend(entry.items.iter().filter(|l| l.is_bookkeeping()).cloned());

    Consumption {
        items,
        date: new_date,
        ..entry.clone()
    }
}

/// Marks an entry settled.
pub fn settle(entry: &Consumption, payment: Payment) -> Consumption {
    Consumption {
        payment: Some(payment),
        ..entry.clone()
    }
}

/// Returns a settled entry to pending, stripping every adjustment line.
pub fn reopen(entry: &Consumption) -> Consumption {
    Consumption {
        items: entry
            .items
            .iter()
            .filter(|l| !matches!(l, ConsumptionLine::Adjustment { .. }))
            .cloned()
            .collect(),
        payment: None,
        ..entry.clone()
    }
}

/// Removes the adjustment paired with `carve_out_id`. `None` when the entry
/// has no such line.
pub fn remove_adjustment(entry: &Consumption, carve_out_id: &str) -> Option<Consumption> {
    let is_pair = |line: &ConsumptionLine| {
        matches!(line, ConsumptionLine::Adjustment { carve_out_id: id, .. } if id == carve_out_id)
    };

    if !entry.items.iter().any(is_pair) {
        return None;
    }

    Some(Consumption {
        items: entry.items.iter().filter(|l| !is_pair(l)).cloned().collect(),
        ..entry.clone()
    })
}

/// How a payment reversal is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertPlan {
    /// The entry is a partial-payment carve-out: delete it. `restored_source`
    /// is the original entry with its paired adjustment removed, when the
    /// policy asks for it and the pair was found.
    DeleteCarveOut {
        carve_out_id: String,
        source_entry_id: String,
        restored_source: Option<Consumption>,
    },

    /// Any other settled entry: write it back pending.
    Reopen(Consumption),
}

/// Decides how to revert the payment of `entry`.
///
/// `source` is the entry a carve-out was split from, when it still exists.
pub fn plan_revert(
    entry: &Consumption,
    source: Option<&Consumption>,
    policy: PartialReversalPolicy,
) -> CoreResult<RevertPlan> {
    if entry.is_pending() {
        return Err(CoreError::invalid_state(
            "Consumption",
            &entry.id,
            entry.state_name(),
            "revert payment",
        ));
    }

    match entry.carve_out_source() {
        Some(source_entry_id) => {
            let restored_source = match policy {
                PartialReversalPolicy::KeepAdjustment => None,
                PartialReversalPolicy::RestoreAdjustment => {
                    source.and_then(|s| remove_adjustment(s, &entry.id))
                }
            };
            Ok(RevertPlan::DeleteCarveOut {
                carve_out_id: entry.id.clone(),
                source_entry_id: source_entry_id.to_string(),
                restored_source,
            })
        }
        None => Ok(RevertPlan::Reopen(reopen(entry))),
    }
}

/// Merges the two standing ledger queries (all pending, and everything in the
/// reporting window) into one view: deduplicated by id, newest first.
pub fn merge_views(pending: Vec<Consumption>, windowed: Vec<Consumption>) -> Vec<Consumption> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Consumption> = pending
        .into_iter()
        .chain(windowed)
        .filter(|c| seen.insert(c.id.clone()))
        .collect();

    merged.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    merged
}
