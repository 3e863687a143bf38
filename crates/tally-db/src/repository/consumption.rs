//! # Consumption Repository
//!
//! Ledger queries. Line items live in a JSON column; payment is two nullable
//! columns that are either both set (settled) or both NULL (pending).
//!
//! ## Standing Queries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_pending()              every pending entry, any date              │
//! │  list_dated_within(period)   every entry with period.start ≤ date < end │
//! │                                                                         │
//! │  The snapshot merges both by id, so an old unpaid tab stays visible     │
//! │  however narrow the reporting window is.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use super::{decode_instant, encode_instant};
use crate::error::{DbError, DbResult};
use tally_core::{Consumption, ConsumptionLine, Payment, PaymentMethod, Period};

const SELECT_COLUMNS: &str =
    "SELECT id, employee_id, date, items, payment_date, payment_method FROM consumptions";

/// Row shape of the `consumptions` table.
#[derive(Debug, sqlx::FromRow)]
struct ConsumptionRow {
    id: String,
    employee_id: String,
    date: String,
    items: String,
    payment_date: Option<String>,
    payment_method: Option<PaymentMethod>,
}

impl TryFrom<ConsumptionRow> for Consumption {
    type Error = DbError;

    fn try_from(row: ConsumptionRow) -> DbResult<Self> {
        let items: Vec<ConsumptionLine> = serde_json::from_str(&row.items)?;

        let payment = match (row.payment_date, row.payment_method) {
            (Some(date), Some(method)) => Some(Payment {
                date: decode_instant(&date)?,
                method,
            }),
            (None, None) => None,
            _ => {
                return Err(DbError::InvalidData(format!(
                    "consumption {} has a partial payment record",
                    row.id
                )))
            }
        };

        Ok(Consumption {
            date: decode_instant(&row.date)?,
            id: row.id,
            employee_id: row.employee_id,
            items,
            payment,
        })
    }
}

fn decode_all(rows: Vec<ConsumptionRow>) -> DbResult<Vec<Consumption>> {
    rows.into_iter().map(Consumption::try_from).collect()
}

/// Repository for ledger reads.
#[derive(Debug, Clone)]
pub struct ConsumptionRepository {
    pool: SqlitePool,
}

impl ConsumptionRepository {
    /// Creates a new ConsumptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConsumptionRepository { pool }
    }

    /// Gets an entry by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Consumption>> {
        let row = sqlx::query_as::<_, ConsumptionRow>(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Consumption::try_from).transpose()
    }

    /// All pending entries, newest first.
    pub async fn list_pending(&self) -> DbResult<Vec<Consumption>> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(&format!(
            "{} WHERE payment_date IS NULL ORDER BY date DESC, id DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed pending consumptions");
        decode_all(rows)
    }

    /// All entries whose sale date falls in `period`, newest first.
    pub async fn list_dated_within(&self, period: &Period) -> DbResult<Vec<Consumption>> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(&format!(
            "{} WHERE date >= ?1 AND date < ?2 ORDER BY date DESC, id DESC",
            SELECT_COLUMNS
        ))
        .bind(encode_instant(period.start))
        .bind(encode_instant(period.end))
        .fetch_all(&self.pool)
        .await?;

        debug!(
            count = rows.len(),
            start = %period.start,
            end = %period.end,
            "Listed consumptions in window"
        );
        decode_all(rows)
    }

    /// Every entry of one employee, newest first.
    pub async fn list_for_employee(&self, employee_id: &str) -> DbResult<Vec<Consumption>> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(&format!(
            "{} WHERE employee_id = ?1 ORDER BY date DESC, id DESC",
            SELECT_COLUMNS
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        decode_all(rows)
    }

    /// Number of entries referencing an employee, pending or settled.
    pub async fn count_for_employee(&self, employee_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM consumptions WHERE employee_id = ?1")
                .bind(employee_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
