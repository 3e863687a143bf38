//! # Payment Allocation Engine
//!
//! Applies a payment amount across an employee's pending entries, oldest
//! first, splitting the last entry when the amount runs out partway.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pending entries of employee, sorted by (date, id) ascending            │
//! │                                                                         │
//! │  remaining = amount                                                     │
//! │  for entry in pending:                                                  │
//! │      if remaining == 0            → stop                                │
//! │      if total(entry) <= 0         → skip                                │
//! │      if remaining >= total(entry) → settle entry, remaining -= total    │
//! │      else                         → split:                              │
//! │            carve-out  (settled, PartialPayment = remaining)             │
//! │            original   (pending, + Adjustment = remaining)               │
//! │            remaining = 0                                                │
//! │                                                                         │
//! │  leftover remaining → Allocation::unallocated                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are integer cents, so comparisons that would need a tolerance on
//! floating point values are exact here. The tolerance is applied once, when
//! decimal input is converted with [`Money::from_decimal`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::settle;
use crate::money::Money;
use crate::types::{Consumption, ConsumptionLine, Payment, PaymentMethod};

/// Result of allocating one payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Entries settled in full, in settlement order.
    pub fully_settled: Vec<Consumption>,
    /// The entry that was split, with its new adjustment line. Stays pending.
    pub adjusted_source: Option<Consumption>,
    /// The settled carve-out created by the split.
    pub carve_out: Option<Consumption>,
    /// Part of the amount that matched no pending balance.
    pub unallocated: Money,
}

impl Allocation {
    /// Entries that became settled: full settlements followed by the carve-out.
    pub fn newly_settled(&self) -> Vec<Consumption> {
        self.fully_settled
            .iter()
            .chain(self.carve_out.iter())
            .cloned()
            .collect()
    }

    /// Nothing to write.
    pub fn is_empty(&self) -> bool {
        self.fully_settled.is_empty() && self.carve_out.is_none()
    }

    pub fn allocated(&self) -> Money {
        self.newly_settled().iter().map(Consumption::total).sum()
    }
}

/// Allocates `amount` across the pending entries of `employee_id` found in
/// `entries`.
///
/// `carve_out_id` is used only if a split happens. Callers validate that
/// `amount` is positive.
pub fn allocate(
    entries: &[Consumption],
    employee_id: &str,
    amount: Money,
    method: PaymentMethod,
    now: DateTime<Utc>,
    carve_out_id: impl Into<String>,
) -> Allocation {
    let mut pending: Vec<&Consumption> = entries
        .iter()
        .filter(|c| c.employee_id == employee_id && c.is_pending())
        .collect();
    pending.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let payment = Payment { date: now, method };
    let mut remaining = amount;
    let mut allocation = Allocation {
        fully_settled: Vec::new(),
        adjusted_source: None,
        carve_out: None,
        unallocated: Money::zero(),
    };

    for entry in pending {
        if !remaining.is_positive() {
            break;
        }

        let total = entry.total();
        if !total.is_positive() {
            continue;
        }

        if remaining >= total {
            allocation.fully_settled.push(settle(entry, payment));
            remaining -= total;
        } else {
            let carve_out_id = carve_out_id.into();

            let mut adjusted = entry.clone();
            adjusted.items.push(ConsumptionLine::Adjustment {
                amount: remaining,
                carve_out_id: carve_out_id.clone(),
            });

            allocation.carve_out = Some(Consumption {
                id: carve_out_id,
                employee_id: employee_id.to_string(),
                date: now,
                items: vec![ConsumptionLine::PartialPayment {
                    amount: remaining,
                    source_entry_id: entry.id.clone(),
                }],
                payment: Some(payment),
            });
            allocation.adjusted_source = Some(adjusted);
            remaining = Money::zero();
            break;
        }
    }

    allocation.unallocated = remaining.max(Money::zero());
    allocation
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, 9, 0, 0).unwrap()
    }

    fn pending(id: &str, employee: &str, day: u32, cents: i64) -> Consumption {
        Consumption {
            id: id.to_string(),
            employee_id: employee.to_string(),
            date: at(day),
            items: vec![ConsumptionLine::product("p", 1, Money::from_cents(cents))],
            payment: None,
        }
    }

    #[test]
    fn test_split_scenario() {
        let entries = vec![pending("b", "e1", 2, 1500), pending("a", "e1", 1, 1000)];
        let now = at(10);

        let alloc = allocate(
            &entries,
            "e1",
            Money::from_cents(1200),
            PaymentMethod::Pix,
            now,
            "carve",
        );

        assert_eq!(alloc.fully_settled.len(), 1);
        assert_eq!(alloc.fully_settled[0].id, "a");
        assert_eq!(alloc.fully_settled[0].payment.unwrap().method, PaymentMethod::Pix);

        let carve = alloc.carve_out.as_ref().unwrap();
        assert_eq!(carve.total().cents(), 200);
        assert_eq!(carve.carve_out_source(), Some("b"));
        assert_eq!(carve.date, now);
        assert!(carve.is_settled());

        let source = alloc.adjusted_source.as_ref().unwrap();
        assert!(source.is_pending());
        assert_eq!(source.total().cents(), 1300);
        assert_eq!(carve.total() + source.total(), Money::from_cents(1500));
        assert!(alloc.unallocated.is_zero());
    }

    #[test]
    fn test_exact_amount_settles_without_carve_out() {
        let entries = vec![
            pending("a", "e1", 1, 1000),
            pending("b", "e1", 2, 1500),
            pending("c", "e1", 3, 700),
        ];
        let alloc = allocate(
            &entries,
            "e1",
            Money::from_cents(2500),
            PaymentMethod::Cash,
            at(10),
            "carve",
        );

        let ids: Vec<&str> = alloc.fully_settled.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(alloc.carve_out.is_none());
        assert!(alloc.adjusted_source.is_none());

        let expected = settle(
            &entries[0],
            Payment {
                date: at(10),
                method: PaymentMethod::Cash,
            },
        );
        assert_eq!(alloc.fully_settled[0], expected);
        assert_eq!(alloc.fully_settled[0].items, entries[0].items);
    }

    #[test]
    fn test_money_is_conserved() {
        let entries = vec![
            pending("a", "e1", 1, 333),
            pending("b", "e1", 2, 1001),
            pending("c", "e1", 3, 250),
        ];
        let before: Money = entries.iter().map(Consumption::total).sum();

        for paid in [1, 333, 334, 1000, 1584] {
            let alloc = allocate(
                &entries,
                "e1",
                Money::from_cents(paid),
                PaymentMethod::Card,
                at(10),
                "carve",
            );
            assert_eq!(alloc.allocated().cents(), paid);

            let still_pending: Money = entries
                .iter()
                .filter(|c| !alloc.fully_settled.iter().any(|s| s.id == c.id))
                .map(|c| match &alloc.adjusted_source {
                    Some(adj) if adj.id == c.id => adj.total(),
                    _ => c.total(),
                })
                .sum();
            assert_eq!(before - Money::from_cents(paid), still_pending);
        }
    }

    #[test]
    fn test_overpayment_is_unallocated() {
        let entries = vec![pending("a", "e1", 1, 1000)];
        let alloc = allocate(
            &entries,
            "e1",
            Money::from_cents(1500),
            PaymentMethod::Pix,
            at(10),
            "carve",
        );
        assert_eq!(alloc.fully_settled.len(), 1);
        assert_eq!(alloc.unallocated.cents(), 500);
    }

    #[test]
    fn test_skips_other_employees_settled_and_non_positive_entries() {
        let mut settled = pending("s", "e1", 1, 400);
        settled.payment = Some(Payment {
            date: at(2),
            method: PaymentMethod::Cash,
        });
        let mut zeroed = pending("z", "e1", 2, 400);
        zeroed.items.push(ConsumptionLine::Adjustment {
            amount: Money::from_cents(400),
            carve_out_id: "old".to_string(),
        });
        let entries = vec![settled, zeroed, pending("o", "e2", 1, 100), pending("a", "e1", 3, 900)];

        let alloc = allocate(
            &entries,
            "e1",
            Money::from_cents(900),
            PaymentMethod::Pix,
            at(10),
            "carve",
        );
        assert_eq!(alloc.fully_settled.len(), 1);
        assert_eq!(alloc.fully_settled[0].id, "a");
    }

    #[test]
    fn test_ties_break_by_id() {
        let entries = vec![pending("b", "e1", 1, 500), pending("a", "e1", 1, 500)];
        let alloc = allocate(
            &entries,
            "e1",
            Money::from_cents(500),
            PaymentMethod::Pix,
            at(1) + Duration::hours(1),
            "carve",
        );
        assert_eq!(alloc.fully_settled[0].id, "a");
    }
}
