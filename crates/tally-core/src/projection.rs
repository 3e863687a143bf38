//! # Projection Layer
//!
//! Read-only aggregates over a ledger snapshot. Everything here is a pure
//! function of the slices it is given; the service calls these against its
//! last-known snapshot.
//!
//! ## Which Entries Count
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Outstanding balances   pending entries, Σ total (adjustments included) │
//! │  Revenue / performance  settled entries with payment.date in period     │
//! │  Category / products    settled in period, Product lines only           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Revenue follows the payment date, not the sale date: a tab run up in
//! September and paid in October is October revenue.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Category, Company, Consumption, ConsumptionLine, Employee, Period, Product};

/// Name reported for products that are no longer in the catalog.
pub const MISSING_PRODUCT_NAME: &str = "N/A";

// =============================================================================
// Report Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompanyPerformance {
    pub company_id: String,
    pub company_name: String,
    pub total_sales: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategorySales {
    pub category: Category,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub total: Money,
}

/// One printed line of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub quantity: i64,
    pub name: String,
    pub unit_price: Money,
    pub line_total: Money,
}

impl fmt::Display for ReceiptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x {} ({}) = {}",
            self.quantity, self.name, self.unit_price, self.line_total
        )
    }
}

// =============================================================================
// Outstanding Balances
// =============================================================================

/// Amount still owed by one employee.
pub fn pending_total_for_employee(entries: &[Consumption], employee_id: &str) -> Money {
    entries
        .iter()
        .filter(|c| c.is_pending() && c.employee_id == employee_id)
        .map(Consumption::total)
        .sum()
}

/// Amount still owed by all employees of one company.
pub fn pending_total_for_company(
    entries: &[Consumption],
    employees: &[Employee],
    company_id: &str,
) -> Money {
    let members = employees_of(employees, company_id);
    entries
        .iter()
        .filter(|c| c.is_pending() && members.contains(c.employee_id.as_str()))
        .map(Consumption::total)
        .sum()
}

/// Amount still owed across the whole ledger.
pub fn total_pending_amount(entries: &[Consumption]) -> Money {
    entries
        .iter()
        .filter(|c| c.is_pending())
        .map(Consumption::total)
        .sum()
}

// =============================================================================
// Period Reports
// =============================================================================

/// Total settled in `period` (by payment date).
pub fn monthly_revenue(entries: &[Consumption], period: &Period) -> Money {
    settled_in(entries, period).map(Consumption::total).sum()
}

/// Settled totals per company, highest first. Every company is listed, with
/// zero when nothing was settled.
pub fn company_performance(
    entries: &[Consumption],
    employees: &[Employee],
    companies: &[Company],
    period: &Period,
) -> Vec<CompanyPerformance> {
    let company_of: HashMap<&str, &str> = employees
        .iter()
        .map(|e| (e.id.as_str(), e.company_id.as_str()))
        .collect();

    let mut totals: HashMap<&str, Money> = HashMap::new();
    for entry in settled_in(entries, period) {
        if let Some(company_id) = company_of.get(entry.employee_id.as_str()) {
            *totals.entry(*company_id).or_default() += entry.total();
        }
    }

    let mut rows: Vec<CompanyPerformance> = companies
        .iter()
        .map(|company| CompanyPerformance {
            company_id: company.id.clone(),
            company_name: company.name.clone(),
            total_sales: totals.get(company.id.as_str()).copied().unwrap_or_default(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_sales
            .cmp(&a.total_sales)
            .then_with(|| a.company_name.cmp(&b.company_name))
    });
    rows
}

/// Settled product value per category, highest first. All categories are
/// reported. Lines whose product left the catalog have no category and are
/// not counted.
pub fn sales_by_category(
    entries: &[Consumption],
    catalog: &[Product],
    period: &Period,
) -> Vec<CategorySales> {
    let category_of: HashMap<&str, Category> = catalog
        .iter()
        .map(|p| (p.id.as_str(), p.category))
        .collect();

    let mut totals: HashMap<Category, Money> = HashMap::new();
    for line in settled_in(entries, period).flat_map(Consumption::product_lines) {
        if let ConsumptionLine::Product { product_id, .. } = line {
            if let Some(category) = category_of.get(product_id.as_str()) {
                *totals.entry(*category).or_default() += line.value();
            }
        }
    }

    let mut rows: Vec<CategorySales> = Category::ALL
        .iter()
        .map(|category| CategorySales {
            category: *category,
            total: totals.get(category).copied().unwrap_or_default(),
        })
        .collect();

    // Stable sort keeps Category::ALL order between equal totals.
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

/// Settled quantity and value per product, highest value first.
pub fn best_selling_products(
    entries: &[Consumption],
    catalog: &[Product],
    period: &Period,
) -> Vec<ProductSales> {
    let mut rows: Vec<ProductSales> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in settled_in(entries, period).flat_map(Consumption::product_lines) {
        let ConsumptionLine::Product {
            product_id,
            quantity,
            ..
        } = line
        else {
            continue;
        };

        let slot = *index.entry(product_id.clone()).or_insert_with(|| {
            rows.push(ProductSales {
                product_id: product_id.clone(),
                name: product_name(catalog, product_id)
                    .unwrap_or(MISSING_PRODUCT_NAME)
                    .to_string(),
                quantity: 0,
                total: Money::zero(),
            });
            rows.len() - 1
        });

        rows[slot].quantity += quantity;
        rows[slot].total += line.value();
    }

    rows.sort_by(|a, b| match b.total.cmp(&a.total) {
        Ordering::Equal => b.quantity.cmp(&a.quantity),
        other => other,
    });
    rows
}

// =============================================================================
// Views
// =============================================================================

/// All entries of one employee, newest first.
pub fn consumptions_for_employee(entries: &[Consumption], employee_id: &str) -> Vec<Consumption> {
    let mut view: Vec<Consumption> = entries
        .iter()
        .filter(|c| c.employee_id == employee_id)
        .cloned()
        .collect();
    view.sort_by(|a, b| b.date.cmp(&a.date));
    view
}

/// Flattens entries into printable receipt lines, in entry order.
pub fn receipt_lines(entries: &[Consumption], catalog: &[Product]) -> Vec<ReceiptLine> {
    entries
        .iter()
        .flat_map(|c| c.items.iter())
        .map(|line| match line {
            ConsumptionLine::Product {
                product_id,
                quantity,
                price_at_time,
            } => ReceiptLine {
                quantity: *quantity,
                name: product_name(catalog, product_id)
                    .unwrap_or("Product")
                    .to_string(),
                unit_price: *price_at_time,
                line_total: line.value(),
            },
            ConsumptionLine::PartialPayment { .. } => ReceiptLine {
                quantity: 1,
                name: "Partial payment".to_string(),
                unit_price: line.value(),
                line_total: line.value(),
            },
            ConsumptionLine::Adjustment { .. } => ReceiptLine {
                quantity: 1,
                name: "Payment adjustment".to_string(),
                unit_price: line.value(),
                line_total: line.value(),
            },
        })
        .collect()
}

// =============================================================================
// Helpers
// =============================================================================

fn settled_in<'a>(
    entries: &'a [Consumption],
    period: &'a Period,
) -> impl Iterator<Item = &'a Consumption> + 'a {
    entries.iter().filter(move |c| c.settled_within(period))
}

fn employees_of<'a>(employees: &'a [Employee], company_id: &str) -> HashSet<&'a str> {
    employees
        .iter()
        .filter(|e| e.company_id == company_id)
        .map(|e| e.id.as_str())
        .collect()
}

fn product_name<'a>(catalog: &'a [Product], product_id: &str) -> Option<&'a str> {
    catalog
        .iter()
        .find(|p| p.id == product_id)
        .map(|p| p.name.as_str())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Payment, PaymentMethod};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, month, day, 12, 0, 0).unwrap()
    }

    fn product(id: &str, name: &str, category: Category, cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price: Money::from_cents(cents),
            category,
            stock: 10,
        }
    }

    fn entry(id: &str, employee: &str, lines: Vec<ConsumptionLine>, paid: Option<DateTime<Utc>>) -> Consumption {
        Consumption {
            id: id.to_string(),
            employee_id: employee.to_string(),
            date: at(9, 20),
            items: lines,
            payment: paid.map(|date| Payment {
                date,
                method: PaymentMethod::Pix,
            }),
        }
    }

    fn employee(id: &str, company: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: id.to_uppercase(),
            contact_handle: String::new(),
            company_id: company.to_string(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("coxinha", "Coxinha", Category::Snack, 650),
            product("suco", "Suco", Category::Drink, 500),
        ]
    }

    fn ledger() -> Vec<Consumption> {
        vec![
            entry("a", "e1", vec![ConsumptionLine::product("coxinha", 2, Money::from_cents(650))], None),
            entry("b", "e2", vec![ConsumptionLine::product("suco", 1, Money::from_cents(500))], None),
            entry(
                "c",
                "e1",
                vec![ConsumptionLine::product("suco", 3, Money::from_cents(500))],
                Some(at(10, 2)),
            ),
            entry(
                "d",
                "e2",
                vec![ConsumptionLine::product("gone", 1, Money::from_cents(900))],
                Some(at(10, 5)),
            ),
            entry(
                "e",
                "e1",
                vec![ConsumptionLine::PartialPayment {
                    amount: Money::from_cents(100),
                    source_entry_id: "a".to_string(),
                }],
                Some(at(10, 6)),
            ),
            entry(
                "f",
                "e1",
                vec![ConsumptionLine::product("coxinha", 1, Money::from_cents(650))],
                Some(at(9, 30)),
            ),
        ]
    }

    #[test]
    fn test_pending_totals() {
        let entries = ledger();
        let employees = vec![employee("e1", "acme"), employee("e2", "globex")];

        assert_eq!(pending_total_for_employee(&entries, "e1").cents(), 1300);
        assert_eq!(pending_total_for_company(&entries, &employees, "globex").cents(), 500);
        assert_eq!(total_pending_amount(&entries).cents(), 1800);
    }

    #[test]
    fn test_monthly_revenue_uses_payment_date() {
        let october = Period::month_of(at(10, 1));
        assert_eq!(monthly_revenue(&ledger(), &october).cents(), 1500 + 900 + 100);

        let september = Period::month_of(at(9, 1));
        assert_eq!(monthly_revenue(&ledger(), &september).cents(), 650);
    }

    #[test]
    fn test_company_performance_lists_every_company() {
        let employees = vec![employee("e1", "acme"), employee("e2", "globex")];
        let companies = vec![
            Company {
                id: "idle".to_string(),
                name: "Idle".to_string(),
            },
            Company {
                id: "globex".to_string(),
                name: "Globex".to_string(),
            },
            Company {
                id: "acme".to_string(),
                name: "Acme".to_string(),
            },
        ];

        let rows = company_performance(&ledger(), &employees, &companies, &Period::month_of(at(10, 1)));
        let summary: Vec<(&str, i64)> = rows
            .iter()
            .map(|r| (r.company_id.as_str(), r.total_sales.cents()))
            .collect();
        assert_eq!(summary, vec![("acme", 1600), ("globex", 900), ("idle", 0)]);
    }

    #[test]
    fn test_sales_by_category_counts_product_lines_only() {
        let rows = sales_by_category(&ledger(), &catalog(), &Period::month_of(at(10, 1)));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].category, Category::Drink);
        assert_eq!(rows[0].total.cents(), 1500);
        let total: Money = rows.iter().map(|r| r.total).sum();
        assert_eq!(total.cents(), 1500);
    }

    #[test]
    fn test_best_selling_products() {
        let rows = best_selling_products(&ledger(), &catalog(), &Period::month_of(at(10, 1)));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Suco");
        assert_eq!(rows[0].quantity, 3);
        assert_eq!(rows[1].name, MISSING_PRODUCT_NAME);
    }

    #[test]
    fn test_consumptions_for_employee_newest_first() {
        let mut entries = ledger();
        entries[0].date = at(9, 1);
        let view = consumptions_for_employee(&entries, "e1");
        assert_eq!(view.len(), 4);
        assert_eq!(view.last().unwrap().id, "a");
        assert!(view.iter().all(|c| c.employee_id == "e1"));
    }

    #[test]
    fn test_receipt_lines() {
        let lines = receipt_lines(&ledger()[..1], &catalog());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to_string(), "2x Coxinha (6.50) = 13.00");
    }
}
