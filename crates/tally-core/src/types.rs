//! # Domain Types
//!
//! Core domain types used throughout the ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Company      │   │    Employee     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  price (Money)  │   │  name           │   │  company_id ────┼──►    │
//! │  │  category       │   └─────────────────┘   └─────────────────┘       │
//! │  │  stock          │                                                   │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────────────┐   ┌─────────────────┐        │
//! │  │             Consumption              │   │    Payment      │        │
//! │  │  ──────────────────────────────────  │   │  ─────────────  │        │
//! │  │  id, employee_id, date               │   │  date           │        │
//! │  │  items: Vec<ConsumptionLine>         │   │  method         │        │
//! │  │  payment: Option<Payment> ───────────┼──►└─────────────────┘        │
//! │  └──────────────────────────────────────┘                              │
//! │                                                                         │
//! │  ConsumptionLine                                                        │
//! │  ├── Product        { product_id, quantity, price_at_time }  stock ✔   │
//! │  ├── PartialPayment { amount, source_entry_id }              stock ✘   │
//! │  └── Adjustment     { amount, carve_out_id }   (value −amount) stock ✘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

/// Company that groups anonymous point-of-sale transactions.
pub const WALK_IN_COMPANY_ID: &str = "walk-in-company";

/// Employee every walk-in sale is attributed to. Walk-in sales are always
/// created already settled.
pub const WALK_IN_EMPLOYEE_ID: &str = "walk-in-employee";

/// Generates a new entry id. Callers generate it once and reuse it when
/// retrying an add, so a retried add never creates a duplicate.
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Product
// =============================================================================

/// Product category, used by the sales-by-category projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Snack,
    Food,
    Drink,
    Dessert,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Snack,
        Category::Food,
        Category::Drink,
        Category::Dessert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Snack => "snack",
            Category::Food => "food",
            Category::Drink => "drink",
            Category::Dessert => "dessert",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "snack" => Ok(Category::Snack),
            "food" => Ok(Category::Food),
            "drink" => Ok(Category::Drink),
            "dessert" => Ok(Category::Dessert),
            other => Err(ValidationError::InvalidFormat {
                field: "category".to_string(),
                reason: format!("unknown category '{}'", other),
            }),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Current catalog price. Copied into each ledger line at creation.
    pub price: Money,
    pub category: Category,
    /// Units on hand, never negative.
    pub stock: i64,
}

// =============================================================================
// Parties
// =============================================================================

/// A client company whose employees run tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Company {
    pub id: String,
    pub name: String,
}

impl Company {
    pub fn is_walk_in(&self) -> bool {
        self.id == WALK_IN_COMPANY_ID
    }
}

/// An employee of a client company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub name: String,
    /// Messaging handle receipts are sent to (may be empty).
    pub contact_handle: String,
    pub company_id: String,
}

impl Employee {
    pub fn is_walk_in(&self) -> bool {
        self.id == WALK_IN_EMPLOYEE_ID
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant bank transfer.
    Pix,
    /// Physical cash.
    Cash,
    /// Card on an external terminal.
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pix" => Ok(PaymentMethod::Pix),
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            other => Err(ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("unknown method '{}'", other),
            }),
        }
    }
}

/// Settlement of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    /// When the money was received (distinct from the sale date).
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub method: PaymentMethod,
}

// =============================================================================
// Ledger Lines
// =============================================================================

/// One line of a ledger entry.
///
/// Bookkeeping lines are their own variants so that "no stock weight" is a
/// property of the type: only [`ConsumptionLine::Product`] ever reaches the
/// stock reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind")]
pub enum ConsumptionLine {
    /// A sold product, priced at the moment the line was created.
    #[serde(rename = "product")]
    Product {
        product_id: String,
        quantity: i64,
        price_at_time: Money,
    },

    /// The single line of a carve-out entry: the settled fraction of
    /// `source_entry_id`.
    #[serde(rename = "partial-payment")]
    PartialPayment {
        amount: Money,
        source_entry_id: String,
    },

    /// Appended to a pending entry after a carve-out; worth `-amount`.
    #[serde(rename = "payment-adjustment")]
    Adjustment { amount: Money, carve_out_id: String },
}

impl ConsumptionLine {
    pub fn product(product_id: impl Into<String>, quantity: i64, price_at_time: Money) -> Self {
        ConsumptionLine::Product {
            product_id: product_id.into(),
            quantity,
            price_at_time,
        }
    }

    /// Signed contribution of this line to the entry total.
    pub fn value(&self) -> Money {
        match self {
            ConsumptionLine::Product {
                quantity,
                price_at_time,
                ..
            } => price_at_time.multiply_quantity(*quantity),
            ConsumptionLine::PartialPayment { amount, .. } => *amount,
            ConsumptionLine::Adjustment { amount, .. } => -*amount,
        }
    }

    /// `(product_id, quantity)` for lines that move inventory.
    pub fn stock_weight(&self) -> Option<(&str, i64)> {
        match self {
            ConsumptionLine::Product {
                product_id,
                quantity,
                ..
            } => Some((product_id.as_str(), *quantity)),
            _ => None,
        }
    }

    pub fn is_bookkeeping(&self) -> bool {
        !matches!(self, ConsumptionLine::Product { .. })
    }
}

// =============================================================================
// Consumption (ledger entry)
// =============================================================================

/// One recorded sale against one employee, pending or settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Consumption {
    pub id: String,
    pub employee_id: String,
    /// Sale date, distinct from the settlement time.
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<ConsumptionLine>,
    pub payment: Option<Payment>,
}

impl Consumption {
    /// `Σ line values`; for a pending entry this is the amount still owed.
    pub fn total(&self) -> Money {
        self.items.iter().map(ConsumptionLine::value).sum()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.payment.is_none()
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.payment.is_some()
    }

    pub fn state_name(&self) -> &'static str {
        if self.is_settled() {
            "settled"
        } else {
            "pending"
        }
    }

    /// The entry this carve-out was split from, if this is a carve-out.
    pub fn carve_out_source(&self) -> Option<&str> {
        self.items.iter().find_map(|line| match line {
            ConsumptionLine::PartialPayment {
                source_entry_id, ..
            } => Some(source_entry_id.as_str()),
            _ => None,
        })
    }

    pub fn is_carve_out(&self) -> bool {
        self.carve_out_source().is_some()
    }

    pub fn product_lines(&self) -> impl Iterator<Item = &ConsumptionLine> {
        self.items.iter().filter(|line| !line.is_bookkeeping())
    }

    /// Whether the payment date falls within `period`.
    pub fn settled_within(&self, period: &Period) -> bool {
        self.payment
            .as_ref()
            .map(|p| period.contains(p.date))
            .unwrap_or(false)
    }
}

/// What a caller asks for when adding or editing: a product and a quantity.
/// The price is always captured from the catalog by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl ItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        ItemRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Copy of a deleted entry kept for forensic recovery. Never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrashRecord {
    pub entry: Consumption,
    #[ts(as = "String")]
    pub deleted_at: DateTime<Utc>,
    pub reason: String,
}

// =============================================================================
// Reporting Period
// =============================================================================

/// Half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Period {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Period { start, end }
    }

    /// The calendar month (UTC) containing `instant`.
    pub fn month_of(instant: DateTime<Utc>) -> Self {
        let start = Utc
            .with_ymd_and_hms(instant.year(), instant.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(instant);
        let (year, month) = if instant.month() == 12 {
            (instant.year() + 1, 1)
        } else {
            (instant.year(), instant.month() + 1)
        };
        let end = Utc
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .single()
            .unwrap_or(instant);
        Period { start, end }
    }

    /// The `days` days up to and including `until`.
    pub fn trailing_days(until: DateTime<Utc>, days: u32) -> Self {
        Period {
            start: until - Duration::days(i64::from(days)),
            end: until,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Midnight UTC of a calendar day, the instant sale dates picked from a
/// date field are recorded at.
pub fn sale_date_from_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

// =============================================================================
// Unit Tests
// =============================================================================
