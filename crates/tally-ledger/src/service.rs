//! # Ledger Service
//!
//! Caller-facing operations over the ledger, the catalog and the parties.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One Caller Operation                             │
//! │                                                                         │
//! │  1. Validate input              ValidationError → INVALID_ARGUMENT      │
//! │  2. Read current records        (from the store, not the snapshot)     │
//! │  3. Apply ledger rules          tally-core: price, allocate, deltas    │
//! │  4. Stage a WriteBatch          entry writes + stock writes + trash    │
//! │  5. Database::commit(batch)     one transaction, all or nothing        │
//! │  6. Rebuild the snapshot        also triggered by the watcher task     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Ordering
//! Rebuilds are serialized by a mutex and tagged with the commit sequence
//! they started from. A rebuild never replaces a snapshot with a higher
//! sequence, so the watcher and the post-commit refresh can race freely.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::allocation::allocate;
use tally_core::ledger::{
    new_entry, plan_revert, price_items, replace_product_lines, ConsumptionDraft, RevertPlan,
};
use tally_core::projection::{self, CategorySales, CompanyPerformance, ProductSales, ReceiptLine};
use tally_core::stock::{StockDeltas, StockWrite};
use tally_core::validation::{
    validate_id, validate_items, validate_name, validate_payment_amount, validate_price,
    validate_stock, validate_stock_delta,
};
use tally_core::{
    Category, Company, Consumption, CoreError, Employee, ItemRequest, Money, PartialReversalPolicy,
    PaymentMethod, Period, Product, TrashRecord, TRASH_REASON_DELETED, WALK_IN_COMPANY_ID,
    WALK_IN_EMPLOYEE_ID,
};
use tally_db::{now, storable, ChangeNotice, Database, DbError, WriteBatch, WriteOp};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::snapshot::Snapshot;

// =============================================================================
// Service
// =============================================================================

/// Handle to a running ledger service. Cheap to clone.
#[derive(Clone)]
pub struct LedgerService {
    inner: Arc<Inner>,
}

struct Inner {
    db: Database,
    config: LedgerConfig,
    snapshot: RwLock<Arc<Snapshot>>,
    /// Explicit reporting window; `None` follows the rolling default.
    window: RwLock<Option<Period>>,
    /// Serializes snapshot rebuilds.
    refresh_lock: Mutex<()>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl LedgerService {
    /// Loads the first snapshot and starts the change-feed watcher.
    pub async fn start(db: Database, config: LedgerConfig) -> LedgerResult<Self> {
        let window = rolling_window(config.reporting.window_days);
        let feed = db.subscribe();

        let inner = Arc::new(Inner {
            db,
            config,
            snapshot: RwLock::new(Arc::new(Snapshot::empty(window))),
            window: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            watcher: Mutex::new(None),
        });

        let service = LedgerService { inner };
        service.refresh().await?;

        let handle = tokio::spawn(watch(Arc::downgrade(&service.inner), feed));
        *service.inner.watcher.lock().await = Some(handle);

        info!(
            window_start = %window.start,
            window_end = %window.end,
            partial_reversal = ?service.inner.config.partial_reversal(),
            allow_settled_edits = service.inner.config.allow_settled_edits(),
            "Ledger service started"
        );
        Ok(service)
    }

    /// Stops the watcher. The database handle stays open for its owner.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.inner.watcher.lock().await.take() {
            handle.abort();
        }
        info!("Ledger service stopped");
    }

    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.inner.config
    }

    /// The last-known snapshot.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot.read().await.clone()
    }

    /// Rebuilds the snapshot from the store.
    pub async fn refresh(&self) -> LedgerResult<()> {
        self.inner.refresh().await
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Records a sale.
    ///
    /// ## Idempotency
    /// The draft's id is the idempotency key. If an entry with that id is
    /// already stored, it is returned and no stock moves.
    pub async fn add_consumption(&self, draft: ConsumptionDraft) -> LedgerResult<Consumption> {
        validate_id("entry id", &draft.id)?;
        validate_id("employee id", &draft.employee_id)?;
        validate_items(&draft.items)?;

        let db = &self.inner.db;
        if let Some(stored) = db.consumptions().get_by_id(&draft.id).await? {
            debug!(id = %draft.id, "Entry already recorded, returning stored entry");
            return Ok(stored);
        }

        if db.parties().get_employee(&draft.employee_id).await?.is_none() {
            return Err(CoreError::not_found("Employee", &draft.employee_id).into());
        }

        let catalog = db.products().list_all().await?;
        let lines = price_items(&draft.items, &catalog)?;
        let entry = new_entry(
            &draft.id,
            &draft.employee_id,
            lines,
            storable(draft.sale_date),
            draft.payment,
            now(),
        );

        let mut batch = WriteBatch::new();
        batch
            .insert_consumption(entry.clone())
            .adjust_stock(StockDeltas::for_sale(&entry.items).stage(&catalog));

        match db.commit(batch).await {
            Ok(seq) => {
                info!(
                    id = %entry.id,
                    employee_id = %entry.employee_id,
                    total = %entry.total(),
                    settled = entry.is_settled(),
                    seq,
                    "Consumption recorded"
                );
                self.after_commit().await;
                Ok(entry)
            }
            Err(DbError::UniqueViolation { .. }) => {
                debug!(id = %entry.id, "Concurrent retry committed first");
                db.consumptions()
                    .get_by_id(&entry.id)
                    .await?
                    .ok_or_else(|| LedgerError::not_found("Consumption", &entry.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Records an anonymous point-of-sale transaction, settled immediately.
    pub async fn add_walk_in_sale(
        &self,
        items: Vec<ItemRequest>,
        sale_date: DateTime<Utc>,
        method: PaymentMethod,
    ) -> LedgerResult<Consumption> {
        let draft = ConsumptionDraft::new(WALK_IN_EMPLOYEE_ID, items, sale_date).paid_with(method);
        self.add_consumption(draft).await
    }

    /// Replaces the product lines and the date of an entry, moving stock by
    /// the per-product difference.
    pub async fn edit_consumption(
        &self,
        id: &str,
        items: Vec<ItemRequest>,
        sale_date: DateTime<Utc>,
    ) -> LedgerResult<Consumption> {
        validate_id("entry id", id)?;
        validate_items(&items)?;

        let db = &self.inner.db;
        let existing = db
            .consumptions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Consumption", id))?;

        if existing.is_settled() {
            if !self.inner.config.allow_settled_edits() {
                return Err(CoreError::invalid_state(
                    "Consumption",
                    id,
                    existing.state_name(),
                    "edit",
                )
                .into());
            }
            warn!(id, "Editing a settled entry");
        }

        let catalog = db.products().list_all().await?;
        let lines = price_items(&items, &catalog)?;
        let edited = replace_product_lines(&existing, lines, storable(sale_date));
        let deltas = StockDeltas::for_edit(&existing.items, &edited.items);

        let mut batch = WriteBatch::new();
        batch
            .put_consumption(edited.clone())
            .adjust_stock(deltas.stage(&catalog));

        let seq = db.commit(batch).await?;
        info!(id, total = %edited.total(), seq, "Consumption edited");
        self.after_commit().await;
        Ok(edited)
    }

    /// Moves an entry to the trash mirror and restores its stock.
    pub async fn delete_consumption(&self, id: &str) -> LedgerResult<()> {
        validate_id("entry id", id)?;

        let db = &self.inner.db;
        let existing = db
            .consumptions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Consumption", id))?;

        let catalog = db.products().list_all().await?;
        let restore = StockDeltas::for_restore(&existing.items).stage(&catalog);

        let mut batch = WriteBatch::new();
        batch
            .put_trash(TrashRecord {
                entry: existing.clone(),
                deleted_at: now(),
                reason: TRASH_REASON_DELETED.to_string(),
            })
            .delete_consumption(id)
            .adjust_stock(restore);

        let seq = db.commit(batch).await?;
        info!(id, total = %existing.total(), seq, "Consumption deleted");
        self.after_commit().await;
        Ok(())
    }

    /// Undoes the settlement of an entry.
    ///
    /// A partial-payment carve-out is deleted; what happens to the adjustment
    /// it left on the original entry depends on the configured
    /// [`PartialReversalPolicy`]. Any other settled entry goes back to pending
    /// with its adjustment lines stripped.
    pub async fn revert_payment(&self, id: &str) -> LedgerResult<RevertPlan> {
        validate_id("entry id", id)?;

        let db = &self.inner.db;
        let entry = db
            .consumptions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Consumption", id))?;

        let source = match entry.carve_out_source() {
            Some(source_id) => db.consumptions().get_by_id(source_id).await?,
            None => None,
        };

        let policy = self.inner.config.partial_reversal();
        let plan = plan_revert(&entry, source.as_ref(), policy)?;

        let mut batch = WriteBatch::new();
        match &plan {
            RevertPlan::DeleteCarveOut {
                carve_out_id,
                source_entry_id,
                restored_source,
            } => {
                batch.delete_consumption(carve_out_id.as_str());
                match (policy, restored_source) {
                    (_, Some(restored)) => {
                        batch.put_consumption(restored.clone());
                    }
                    (PartialReversalPolicy::KeepAdjustment, None) => {
                        warn!(
                            carve_out_id = %carve_out_id,
                            source_entry_id = %source_entry_id,
                            "Partial payment reverted; adjustment stays on the original entry"
                        );
                    }
                    (PartialReversalPolicy::RestoreAdjustment, None) => {
                        warn!(
                            carve_out_id = %carve_out_id,
                            source_entry_id = %source_entry_id,
                            "Partial payment reverted; no paired adjustment found to restore"
                        );
                    }
                }
            }
            RevertPlan::Reopen(reopened) => {
                batch.put_consumption(reopened.clone());
            }
        }

        let seq = db.commit(batch).await?;
        info!(id, seq, "Payment reverted");
        self.after_commit().await;
        Ok(plan)
    }

    /// Applies a payment to the employee's pending entries, oldest first.
    ///
    /// Returns the entries that became settled: full settlements in order,
    /// then the partial-payment carve-out if the amount ran out partway.
    pub async fn record_payment(
        &self,
        employee_id: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> LedgerResult<Vec<Consumption>> {
        validate_id("employee id", employee_id)?;
        validate_payment_amount(amount)?;

        let db = &self.inner.db;
        if db.parties().get_employee(employee_id).await?.is_none() {
            return Err(CoreError::not_found("Employee", employee_id).into());
        }

        let entries = db.consumptions().list_for_employee(employee_id).await?;
        let allocation = allocate(
            &entries,
            employee_id,
            amount,
            method,
            now(),
            Uuid::new_v4().to_string(),
        );

        if allocation.unallocated.is_positive() {
            warn!(
                employee_id,
                amount = %amount,
                unallocated = %allocation.unallocated,
                "Payment exceeds the pending balance"
            );
        }

        if allocation.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = WriteBatch::new();
        for settled in &allocation.fully_settled {
            batch.put_consumption(settled.clone());
        }
        if let Some(adjusted) = &allocation.adjusted_source {
            batch.put_consumption(adjusted.clone());
        }
        if let Some(carve_out) = &allocation.carve_out {
            batch.insert_consumption(carve_out.clone());
        }

        let seq = db.commit(batch).await?;
        info!(
            employee_id,
            amount = %amount,
            allocated = %allocation.allocated(),
            settled = allocation.fully_settled.len(),
            split = allocation.carve_out.is_some(),
            seq,
            "Payment recorded"
        );
        self.after_commit().await;
        Ok(allocation.newly_settled())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn add_product(
        &self,
        name: &str,
        price: Money,
        category: Category,
        stock: i64,
    ) -> LedgerResult<Product> {
        validate_name(name)?;
        validate_price(price)?;
        validate_stock(stock)?;

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            price,
            category,
            stock,
        };

        let seq = self
            .commit_one(WriteOp::PutProduct(product.clone()))
            .await?;
        info!(id = %product.id, name = %product.name, seq, "Product added");
        Ok(product)
    }

    /// Rewrites a product. Existing ledger lines keep the price they were
    /// sold at.
    pub async fn edit_product(
        &self,
        id: &str,
        name: &str,
        price: Money,
        category: Category,
        stock: i64,
    ) -> LedgerResult<Product> {
        validate_id("product id", id)?;
        validate_name(name)?;
        validate_price(price)?;
        validate_stock(stock)?;

        if self.inner.db.products().get_by_id(id).await?.is_none() {
            return Err(LedgerError::not_found("Product", id));
        }

        let product = Product {
            id: id.to_string(),
            name: name.trim().to_string(),
            price,
            category,
            stock,
        };

        let seq = self
            .commit_one(WriteOp::PutProduct(product.clone()))
            .await?;
        info!(id, seq, "Product edited");
        Ok(product)
    }

    /// Removes a product from the catalog. Ledger lines that reference it
    /// keep their captured price; reports name it as missing.
    pub async fn delete_product(&self, id: &str) -> LedgerResult<()> {
        validate_id("product id", id)?;

        let seq = self.commit_one(WriteOp::DeleteProduct(id.to_string())).await?;
        info!(id, seq, "Product deleted");
        Ok(())
    }

    /// Manual stock adjustment: `stock = max(0, stock + delta)`.
    pub async fn update_stock(&self, product_id: &str, delta: i64) -> LedgerResult<Product> {
        validate_id("product id", product_id)?;
        validate_stock_delta(delta)?;

        let products = self.inner.db.products();
        if products.get_by_id(product_id).await?.is_none() {
            return Err(LedgerError::not_found("Product", product_id));
        }

        let seq = self
            .commit_one(WriteOp::AdjustStock(StockWrite {
                product_id: product_id.to_string(),
                delta,
            }))
            .await?;

        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Product", product_id))?;
        info!(product_id, delta, stock = product.stock, seq, "Stock updated");
        Ok(product)
    }

    // =========================================================================
    // Parties
    // =========================================================================

    pub async fn add_company(&self, name: &str) -> LedgerResult<Company> {
        validate_name(name)?;

        let company = Company {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
        };

        let seq = self
            .commit_one(WriteOp::PutCompany(company.clone()))
            .await?;
        info!(id = %company.id, name = %company.name, seq, "Company added");
        Ok(company)
    }

    /// Deletes a company that no longer has employees.
    pub async fn delete_company(&self, id: &str) -> LedgerResult<()> {
        validate_id("company id", id)?;

        if id == WALK_IN_COMPANY_ID {
            return Err(
                CoreError::precondition("Company", id, "delete", "it is the walk-in company")
                    .into(),
            );
        }

        let parties = self.inner.db.parties();
        if parties.get_company(id).await?.is_none() {
            return Err(LedgerError::not_found("Company", id));
        }

        let employees = parties.count_employees_of(id).await?;
        if employees > 0 {
            return Err(CoreError::precondition(
                "Company",
                id,
                "delete",
                format!("{} employees belong to it", employees),
            )
            .into());
        }

        let seq = self.commit_one(WriteOp::DeleteCompany(id.to_string())).await?;
        info!(id, seq, "Company deleted");
        Ok(())
    }

    pub async fn add_employee(
        &self,
        name: &str,
        contact_handle: &str,
        company_id: &str,
    ) -> LedgerResult<Employee> {
        validate_name(name)?;
        validate_id("company id", company_id)?;

        if self.inner.db.parties().get_company(company_id).await?.is_none() {
            return Err(LedgerError::not_found("Company", company_id));
        }

        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            contact_handle: contact_handle.trim().to_string(),
            company_id: company_id.to_string(),
        };

        let seq = self
            .commit_one(WriteOp::PutEmployee(employee.clone()))
            .await?;
        info!(id = %employee.id, company_id, seq, "Employee added");
        Ok(employee)
    }

    pub async fn update_employee(
        &self,
        id: &str,
        name: &str,
        contact_handle: &str,
        company_id: &str,
    ) -> LedgerResult<Employee> {
        validate_id("employee id", id)?;
        validate_name(name)?;
        validate_id("company id", company_id)?;

        if id == WALK_IN_EMPLOYEE_ID {
            return Err(
                CoreError::precondition("Employee", id, "update", "it is the walk-in customer")
                    .into(),
            );
        }

        let parties = self.inner.db.parties();
        if parties.get_employee(id).await?.is_none() {
            return Err(LedgerError::not_found("Employee", id));
        }
        if parties.get_company(company_id).await?.is_none() {
            return Err(LedgerError::not_found("Company", company_id));
        }

        let employee = Employee {
            id: id.to_string(),
            name: name.trim().to_string(),
            contact_handle: contact_handle.trim().to_string(),
            company_id: company_id.to_string(),
        };

        let seq = self
            .commit_one(WriteOp::PutEmployee(employee.clone()))
            .await?;
        info!(id, company_id, seq, "Employee updated");
        Ok(employee)
    }

    /// Deletes an employee no ledger entry references.
    pub async fn delete_employee(&self, id: &str) -> LedgerResult<()> {
        validate_id("employee id", id)?;

        if id == WALK_IN_EMPLOYEE_ID {
            return Err(
                CoreError::precondition("Employee", id, "delete", "it is the walk-in customer")
                    .into(),
            );
        }

        let db = &self.inner.db;
        if db.parties().get_employee(id).await?.is_none() {
            return Err(LedgerError::not_found("Employee", id));
        }

        let entries = db.consumptions().count_for_employee(id).await?;
        if entries > 0 {
            return Err(CoreError::precondition(
                "Employee",
                id,
                "delete",
                format!("{} ledger entries reference it", entries),
            )
            .into());
        }

        let seq = self.commit_one(WriteOp::DeleteEmployee(id.to_string())).await?;
        info!(id, seq, "Employee deleted");
        Ok(())
    }

    // =========================================================================
    // Reporting Window
    // =========================================================================

    /// Re-targets the windowed ledger query and rebuilds the snapshot.
    pub async fn set_reporting_window(&self, period: Period) -> LedgerResult<()> {
        if period.start >= period.end {
            return Err(LedgerError::invalid_argument(
                "reporting window must end after it starts",
            ));
        }

        *self.inner.window.write().await = Some(period);
        info!(start = %period.start, end = %period.end, "Reporting window changed");
        self.refresh().await
    }

    /// Goes back to the rolling default window.
    pub async fn reset_reporting_window(&self) -> LedgerResult<()> {
        *self.inner.window.write().await = None;
        self.refresh().await
    }

    /// The window the next snapshot rebuild will use.
    pub async fn reporting_window(&self) -> Period {
        self.inner.current_window().await
    }

    // =========================================================================
    // Projections
    // =========================================================================

    pub async fn pending_total_for_employee(&self, employee_id: &str) -> Money {
        let snapshot = self.snapshot().await;
        projection::pending_total_for_employee(&snapshot.consumptions, employee_id)
    }

    pub async fn pending_total_for_company(&self, company_id: &str) -> Money {
        let snapshot = self.snapshot().await;
        projection::pending_total_for_company(
            &snapshot.consumptions,
            &snapshot.employees,
            company_id,
        )
    }

    pub async fn total_pending_amount(&self) -> Money {
        let snapshot = self.snapshot().await;
        projection::total_pending_amount(&snapshot.consumptions)
    }

    /// Revenue settled in `period`; defaults to the current calendar month.
    pub async fn monthly_revenue(&self, period: Option<Period>) -> Money {
        let period = period.unwrap_or_else(current_month);
        let snapshot = self.snapshot().await;
        projection::monthly_revenue(&snapshot.consumptions, &period)
    }

    pub async fn company_performance(&self, period: Option<Period>) -> Vec<CompanyPerformance> {
        let period = period.unwrap_or_else(current_month);
        let snapshot = self.snapshot().await;
        projection::company_performance(
            &snapshot.consumptions,
            &snapshot.employees,
            &snapshot.companies,
            &period,
        )
    }

    pub async fn sales_by_category(&self, period: Option<Period>) -> Vec<CategorySales> {
        let period = period.unwrap_or_else(current_month);
        let snapshot = self.snapshot().await;
        projection::sales_by_category(&snapshot.consumptions, &snapshot.products, &period)
    }

    pub async fn best_selling_products(&self, period: Option<Period>) -> Vec<ProductSales> {
        let period = period.unwrap_or_else(current_month);
        let snapshot = self.snapshot().await;
        projection::best_selling_products(&snapshot.consumptions, &snapshot.products, &period)
    }

    /// The employee's entries in the snapshot, newest first.
    pub async fn consumptions_for_employee(&self, employee_id: &str) -> Vec<Consumption> {
        let snapshot = self.snapshot().await;
        projection::consumptions_for_employee(&snapshot.consumptions, employee_id)
    }

    /// Receipt lines for `entries`, named from the current catalog.
    pub async fn receipt_lines(&self, entries: &[Consumption]) -> Vec<ReceiptLine> {
        let snapshot = self.snapshot().await;
        projection::receipt_lines(entries, &snapshot.products)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn commit_one(&self, op: WriteOp) -> LedgerResult<u64> {
        let mut batch = WriteBatch::new();
        batch.push(op);
        let seq = self.inner.db.commit(batch).await?;
        self.after_commit().await;
        Ok(seq)
    }

    /// The commit already succeeded; a failed rebuild is left to the watcher.
    async fn after_commit(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Snapshot refresh after commit failed");
        }
    }
}

impl Inner {
    async fn refresh(&self) -> LedgerResult<()> {
        let _guard = self.refresh_lock.lock().await;

        let window = self.current_window().await;
        let fresh = Snapshot::load(&self.db, window).await?;

        let mut current = self.snapshot.write().await;
        if fresh.seq >= current.seq {
            *current = Arc::new(fresh);
        } else {
            debug!(fresh = fresh.seq, current = current.seq, "Discarding stale snapshot");
        }
        Ok(())
    }

    async fn current_window(&self) -> Period {
        match *self.window.read().await {
            Some(period) => period,
            None => rolling_window(self.config.reporting.window_days),
        }
    }
}

/// The last `days` days, ending a day ahead of now so that entries stamped
/// while a rebuild is running still fall inside.
fn rolling_window(days: u32) -> Period {
    let end = now() + ChronoDuration::days(1);
    Period::new(end - ChronoDuration::days(i64::from(days) + 1), end)
}

fn current_month() -> Period {
    Period::month_of(now())
}

/// Rebuilds the snapshot on every change notice until the service is dropped
/// or the feed closes.
async fn watch(service: Weak<Inner>, mut feed: broadcast::Receiver<ChangeNotice>) {
    loop {
        let notice = match feed.recv().await {
            Ok(notice) => Some(notice),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Change feed lagged, rebuilding snapshot");
                None
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Change feed closed");
                break;
            }
        };

        let Some(inner) = service.upgrade() else {
            break;
        };

        if let Some(notice) = &notice {
            if inner.snapshot.read().await.seq >= notice.seq {
                continue;
            }
            debug!(seq = notice.seq, collections = ?notice.collections, "Change notice");
        }

        if let Err(e) = inner.refresh().await {
            warn!(error = %e, "Snapshot refresh from change feed failed");
        }
    }
}
