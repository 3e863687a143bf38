//! # Write Batches
//!
//! A set of staged writes committed as one SQLite transaction.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  WriteBatch::new()                                                      │
//! │    .insert_consumption(entry)                                           │
//! │    .adjust_stock(writes)          staged in memory, nothing touched yet │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::commit(batch)                                                │
//! │    BEGIN                                                                │
//! │      op 1 ─► op 2 ─► ... ─► op n    any error → ROLLBACK, nothing kept  │
//! │    COMMIT                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ChangeFeed::publish(touched collections)                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Operations run in staging order against the transaction's own connection.

use std::collections::BTreeSet;

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::feed::Collection;
use crate::repository::{encode_instant, now};
use tally_core::stock::StockWrite;
use tally_core::{Company, Consumption, Employee, Product, TrashRecord};

/// One staged write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert a new entry. Fails with `UniqueViolation` if the id exists.
    InsertConsumption(Consumption),
    /// Overwrite an existing entry. Fails with `NotFound` if it is gone.
    PutConsumption(Consumption),
    /// Remove an entry. Fails with `NotFound` if it is gone.
    DeleteConsumption(String),
    /// `stock = max(0, stock + delta)`; a missing product is skipped.
    AdjustStock(StockWrite),
    /// Mirror a deleted entry, keyed by its id.
    PutTrash(TrashRecord),
    /// Insert or update a catalog product.
    PutProduct(Product),
    DeleteProduct(String),
    /// Insert or update a company.
    PutCompany(Company),
    DeleteCompany(String),
    /// Insert or update an employee.
    PutEmployee(Employee),
    DeleteEmployee(String),
}

impl WriteOp {
    /// The collection this write lands in.
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::InsertConsumption(_)
            | WriteOp::PutConsumption(_)
            | WriteOp::DeleteConsumption(_) => Collection::Consumptions,
            WriteOp::AdjustStock(_) | WriteOp::PutProduct(_) | WriteOp::DeleteProduct(_) => {
                Collection::Products
            }
            WriteOp::PutTrash(_) => Collection::Trash,
            WriteOp::PutCompany(_) | WriteOp::DeleteCompany(_) => Collection::Companies,
            WriteOp::PutEmployee(_) | WriteOp::DeleteEmployee(_) => Collection::Employees,
        }
    }
}

/// Staged writes for one caller operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn insert_consumption(&mut self, entry: Consumption) -> &mut Self {
        self.push(WriteOp::InsertConsumption(entry))
    }

    pub fn put_consumption(&mut self, entry: Consumption) -> &mut Self {
        self.push(WriteOp::PutConsumption(entry))
    }

    pub fn delete_consumption(&mut self, id: impl Into<String>) -> &mut Self {
        self.push(WriteOp::DeleteConsumption(id.into()))
    }

    pub fn adjust_stock(&mut self, writes: impl IntoIterator<Item = StockWrite>) -> &mut Self {
        for write in writes {
            self.push(WriteOp::AdjustStock(write));
        }
        self
    }

    pub fn put_trash(&mut self, record: TrashRecord) -> &mut Self {
        self.push(WriteOp::PutTrash(record))
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Collections the batch writes to, for the change notice.
    pub fn collections(&self) -> BTreeSet<Collection> {
        self.ops.iter().map(WriteOp::collection).collect()
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Applies one operation on the transaction's connection.
pub(crate) async fn apply(conn: &mut SqliteConnection, op: &WriteOp) -> DbResult<()> {
    match op {
        WriteOp::InsertConsumption(entry) => {
            let result = sqlx::query(
                r#"
                INSERT INTO consumptions (id, employee_id, date, items, payment_date, payment_method)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.employee_id)
            .bind(encode_instant(entry.date))
            .bind(serde_json::to_string(&entry.items)?)
            .bind(entry.payment.map(|p| encode_instant(p.date)))
            .bind(entry.payment.map(|p| p.method))
            .execute(&mut *conn)
            .await;

            match result {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                    Err(DbError::duplicate("consumptions.id", &entry.id))
                }
                Err(e) => Err(e.into()),
            }
        }

        WriteOp::PutConsumption(entry) => {
            let result = sqlx::query(
                r#"
                UPDATE consumptions
                SET employee_id = ?2, date = ?3, items = ?4, payment_date = ?5, payment_method = ?6
                WHERE id = ?1
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.employee_id)
            .bind(encode_instant(entry.date))
            .bind(serde_json::to_string(&entry.items)?)
            .bind(entry.payment.map(|p| encode_instant(p.date)))
            .bind(entry.payment.map(|p| p.method))
            .execute(&mut *conn)
            .await?;

            require_row(result.rows_affected(), "Consumption", &entry.id)
        }

        WriteOp::DeleteConsumption(id) => {
            let result = sqlx::query("DELETE FROM consumptions WHERE id = ?1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
            require_row(result.rows_affected(), "Consumption", id)
        }

        WriteOp::AdjustStock(write) => {
            let result = sqlx::query(
                "UPDATE products SET stock = MAX(0, stock + ?2), updated_at = ?3 WHERE id = ?1",
            )
            .bind(&write.product_id)
            .bind(write.delta)
            .bind(encode_instant(now()))
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                debug!(product_id = %write.product_id, "Stock write skipped, product missing");
            }
            Ok(())
        }

        WriteOp::PutTrash(record) => {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO consumptions_trash (id, payload, deleted_at, reason)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&record.entry.id)
            .bind(serde_json::to_string(&record.entry)?)
            .bind(encode_instant(record.deleted_at))
            .bind(&record.reason)
            .execute(&mut *conn)
            .await?;
            Ok(())
        }

        WriteOp::PutProduct(product) => {
            let stamp = encode_instant(now());
            sqlx::query(
                r#"
                INSERT INTO products (id, name, price_cents, category, stock, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    price_cents = excluded.price_cents,
                    category = excluded.category,
                    stock = excluded.stock,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&product.id)
            .bind(&product.name)
            .bind(product.price.cents())
            .bind(product.category)
            .bind(product.stock)
            .bind(stamp)
            .execute(&mut *conn)
            .await?;
            Ok(())
        }

        WriteOp::DeleteProduct(id) => {
            let result = sqlx::query("DELETE FROM products WHERE id = ?1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
            require_row(result.rows_affected(), "Product", id)
        }

        WriteOp::PutCompany(company) => {
            sqlx::query(
                r#"
                INSERT INTO companies (id, name, created_at) VALUES (?1, ?2, ?3)
                ON CONFLICT (id) DO UPDATE SET name = excluded.name
                "#,
            )
            .bind(&company.id)
            .bind(&company.name)
            .bind(encode_instant(now()))
            .execute(&mut *conn)
            .await?;
            Ok(())
        }

        WriteOp::DeleteCompany(id) => {
            let result = sqlx::query("DELETE FROM companies WHERE id = ?1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
            require_row(result.rows_affected(), "Company", id)
        }

        WriteOp::PutEmployee(employee) => {
            sqlx::query(
                r#"
                INSERT INTO employees (id, name, contact_handle, company_id, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    contact_handle = excluded.contact_handle,
                    company_id = excluded.company_id
                "#,
            )
            .bind(&employee.id)
            .bind(&employee.name)
            .bind(&employee.contact_handle)
            .bind(&employee.company_id)
            .bind(encode_instant(now()))
            .execute(&mut *conn)
            .await?;
            Ok(())
        }

        WriteOp::DeleteEmployee(id) => {
            let result = sqlx::query("DELETE FROM employees WHERE id = ?1")
                .bind(id)
                .execute(&mut *conn)
                .await?;
            require_row(result.rows_affected(), "Employee", id)
        }
    }
}

fn require_row(rows_affected: u64, entity: &str, id: &str) -> DbResult<()> {
    if rows_affected == 0 {
        return Err(DbError::not_found(entity, id));
    }
    Ok(())
}
