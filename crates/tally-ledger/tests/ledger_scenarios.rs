//! End-to-end ledger scenarios against an in-memory database.

use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use tally_core::ledger::RevertPlan;
use tally_core::{
    Category, ConsumptionDraft, ConsumptionLine, Employee, ItemRequest, Money,
    PartialReversalPolicy, PaymentMethod, Period, Product, WALK_IN_COMPANY_ID,
    WALK_IN_EMPLOYEE_ID,
};
use tally_db::{now, Database, DbConfig, WriteBatch, WriteOp};
use tally_ledger::{ErrorKind, LedgerConfig, LedgerService};

// =============================================================================
// Fixtures
// =============================================================================

async fn start_with(config: LedgerConfig) -> LedgerService {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    LedgerService::start(db, config).await.unwrap()
}

async fn start() -> LedgerService {
    start_with(LedgerConfig::default()).await
}

async fn employee(service: &LedgerService) -> Employee {
    let company = service.add_company("Acme").await.unwrap();
    service
        .add_employee("Ana Souza", "5511990000001", &company.id)
        .await
        .unwrap()
}

async fn product(service: &LedgerService, name: &str, cents: i64, stock: i64) -> Product {
    service
        .add_product(name, Money::from_cents(cents), Category::Snack, stock)
        .await
        .unwrap()
}

async fn stock_of(service: &LedgerService, product_id: &str) -> i64 {
    service
        .database()
        .products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

fn days_ago(days: i64) -> DateTime<Utc> {
    now() - ChronoDuration::days(days)
}

/// Two pending entries worth 10.00 (older) and 15.00 (newer).
async fn two_tabs(service: &LedgerService) -> (Employee, String, String) {
    let ana = employee(service).await;
    let ten = product(service, "Marmita", 1000, 50).await;
    let fifteen = product(service, "Combo", 1500, 50).await;

    let first = service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new(&ten.id, 1)],
            days_ago(2),
        ))
        .await
        .unwrap();
    let second = service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new(&fifteen.id, 1)],
            days_ago(1),
        ))
        .await
        .unwrap();

    (ana, first.id, second.id)
}

// =============================================================================
// Payment Allocation
// =============================================================================

#[tokio::test]
async fn test_partial_payment_splits_the_second_entry() {
    let service = start().await;
    let (ana, first_id, second_id) = two_tabs(&service).await;

    let settled = service
        .record_payment(&ana.id, Money::parse("12.00").unwrap(), PaymentMethod::Pix)
        .await
        .unwrap();

    assert_eq!(settled.len(), 2);
    assert_eq!(settled[0].id, first_id);
    assert!(settled[0].is_settled());

    let carve_out = &settled[1];
    assert!(carve_out.is_carve_out());
    assert_eq!(carve_out.total(), Money::from_cents(200));
    assert_eq!(carve_out.carve_out_source(), Some(second_id.as_str()));
    assert_eq!(carve_out.payment.unwrap().method, PaymentMethod::Pix);

    let second = service
        .database()
        .consumptions()
        .get_by_id(&second_id)
        .await
        .unwrap()
        .unwrap();
    assert!(second.is_pending());
    assert_eq!(second.total(), Money::from_cents(1300));

    // carve-out + what is still owed == the original entry
    assert_eq!(carve_out.total() + second.total(), Money::from_cents(1500));

    assert_eq!(
        service.pending_total_for_employee(&ana.id).await,
        Money::from_cents(1300)
    );
    assert_eq!(service.monthly_revenue(None).await, Money::from_cents(1200));
}

#[tokio::test]
async fn test_exact_payment_settles_without_carve_out() {
    let service = start().await;
    let (ana, _, _) = two_tabs(&service).await;

    let settled = service
        .record_payment(&ana.id, Money::from_cents(2500), PaymentMethod::Cash)
        .await
        .unwrap();

    assert_eq!(settled.len(), 2);
    assert!(settled.iter().all(|c| !c.is_carve_out()));
    assert!(service.pending_total_for_employee(&ana.id).await.is_zero());
    assert_eq!(service.total_pending_amount().await, Money::zero());
}

#[tokio::test]
async fn test_money_is_conserved_across_payments() {
    let service = start().await;
    let (ana, _, _) = two_tabs(&service).await;

    let before = service.pending_total_for_employee(&ana.id).await;
    let mut paid = Money::zero();
    for cents in [700, 450, 1000] {
        let amount = Money::from_cents(cents);
        service
            .record_payment(&ana.id, amount, PaymentMethod::Card)
            .await
            .unwrap();
        paid += amount;
    }

    let after = service.pending_total_for_employee(&ana.id).await;
    assert_eq!(before - paid, after);
    assert_eq!(service.monthly_revenue(None).await, paid);
}

#[tokio::test]
async fn test_overpayment_settles_everything() {
    let service = start().await;
    let (ana, _, _) = two_tabs(&service).await;

    let settled = service
        .record_payment(&ana.id, Money::from_cents(10_000), PaymentMethod::Pix)
        .await
        .unwrap();

    assert_eq!(settled.len(), 2);
    assert!(service.pending_total_for_employee(&ana.id).await.is_zero());
    assert_eq!(service.monthly_revenue(None).await, Money::from_cents(2500));
}

#[tokio::test]
async fn test_payment_with_nothing_pending_writes_nothing() {
    let service = start().await;
    let ana = employee(&service).await;
    let seq = service.database().commit_seq();

    let settled = service
        .record_payment(&ana.id, Money::from_cents(500), PaymentMethod::Pix)
        .await
        .unwrap();

    assert!(settled.is_empty());
    assert_eq!(service.database().commit_seq(), seq);
}

#[tokio::test]
async fn test_payment_rejections() {
    let service = start().await;
    let ana = employee(&service).await;

    let err = service
        .record_payment(&ana.id, Money::zero(), PaymentMethod::Pix)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service
        .record_payment("nobody", Money::from_cents(100), PaymentMethod::Pix)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Stock Reconciliation
// =============================================================================

#[tokio::test]
async fn test_stock_follows_add_edit_delete() {
    let service = start().await;
    let ana = employee(&service).await;
    let coxinha = product(&service, "Coxinha", 650, 5).await;

    let entry = service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new(&coxinha.id, 2)],
            days_ago(0),
        ))
        .await
        .unwrap();
    assert_eq!(stock_of(&service, &coxinha.id).await, 3);

    service
        .edit_consumption(&entry.id, vec![ItemRequest::new(&coxinha.id, 4)], entry.date)
        .await
        .unwrap();
    assert_eq!(stock_of(&service, &coxinha.id).await, 1);

    service.delete_consumption(&entry.id).await.unwrap();
    assert_eq!(stock_of(&service, &coxinha.id).await, 5);

    let trashed = service.database().trash().get(&entry.id).await.unwrap().unwrap();
    assert_eq!(trashed.reason, "deleted");
    assert_eq!(trashed.entry.id, entry.id);
}

#[tokio::test]
async fn test_stock_is_floored_at_zero() {
    let service = start().await;
    let ana = employee(&service).await;
    let coxinha = product(&service, "Coxinha", 650, 1).await;

    service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new(&coxinha.id, 3)],
            days_ago(0),
        ))
        .await
        .unwrap();
    assert_eq!(stock_of(&service, &coxinha.id).await, 0);

    let updated = service.update_stock(&coxinha.id, -10).await.unwrap();
    assert_eq!(updated.stock, 0);

    let updated = service.update_stock(&coxinha.id, 7).await.unwrap();
    assert_eq!(updated.stock, 7);

    let err = service.update_stock("missing", 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .update_stock(&coxinha.id, i64::MAX)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(stock_of(&service, &coxinha.id).await, 7);
}

#[tokio::test]
async fn test_edit_round_trip_is_stock_neutral() {
    let service = start().await;
    let ana = employee(&service).await;
    let coxinha = product(&service, "Coxinha", 650, 10).await;
    let suco = product(&service, "Suco", 800, 10).await;
    let items = vec![
        ItemRequest::new(&coxinha.id, 2),
        ItemRequest::new(&suco.id, 1),
    ];

    let entry = service
        .add_consumption(ConsumptionDraft::new(&ana.id, items.clone(), days_ago(1)))
        .await
        .unwrap();

    let edited = service
        .edit_consumption(&entry.id, items, entry.date)
        .await
        .unwrap();

    assert_eq!(edited.total(), entry.total());
    assert_eq!(edited.date, entry.date);
    assert_eq!(stock_of(&service, &coxinha.id).await, 8);
    assert_eq!(stock_of(&service, &suco.id).await, 9);
}

#[tokio::test]
async fn test_edit_keeps_carved_out_amount() {
    let service = start().await;
    let (ana, _, second_id) = two_tabs(&service).await;
    service
        .record_payment(&ana.id, Money::from_cents(1200), PaymentMethod::Pix)
        .await
        .unwrap();

    let second = service
        .database()
        .consumptions()
        .get_by_id(&second_id)
        .await
        .unwrap()
        .unwrap();
    let product_id = match &second.items[0] {
        ConsumptionLine::Product { product_id, .. } => product_id.clone(),
        other => panic!("expected a product line, got {:?}", other),
    };

    let edited = service
        .edit_consumption(&second_id, vec![ItemRequest::new(&product_id, 2)], second.date)
        .await
        .unwrap();

    // 2 x 15.00 minus the 2.00 already paid
    assert_eq!(edited.total(), Money::from_cents(2800));
}

// =============================================================================
// Idempotency & Validation
// =============================================================================

#[tokio::test]
async fn test_retried_add_is_recorded_once() {
    let service = start().await;
    let ana = employee(&service).await;
    let coxinha = product(&service, "Coxinha", 650, 10).await;

    let draft = ConsumptionDraft::new(
        &ana.id,
        vec![ItemRequest::new(&coxinha.id, 2)],
        days_ago(0),
    );

    let first = service.add_consumption(draft.clone()).await.unwrap();
    let retry = service.add_consumption(draft).await.unwrap();

    assert_eq!(first, retry);
    assert_eq!(stock_of(&service, &coxinha.id).await, 8);
    assert_eq!(
        service.pending_total_for_employee(&ana.id).await,
        Money::from_cents(1300)
    );
}

#[tokio::test]
async fn test_add_rejections() {
    let service = start().await;
    let ana = employee(&service).await;
    let coxinha = product(&service, "Coxinha", 650, 10).await;

    let err = service
        .add_consumption(ConsumptionDraft::new(&ana.id, vec![], days_ago(0)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new(&coxinha.id, 0)],
            days_ago(0),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service
        .add_consumption(ConsumptionDraft::new(
            "",
            vec![ItemRequest::new(&coxinha.id, 1)],
            days_ago(0),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service
        .add_consumption(ConsumptionDraft::new(
            "nobody",
            vec![ItemRequest::new(&coxinha.id, 1)],
            days_ago(0),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new("missing", 1)],
            days_ago(0),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new(&coxinha.id, 100_000_000_000_000_000)],
            days_ago(0),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service
        .add_product("Caviar", Money::from_cents(i64::MAX), Category::Snack, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // nothing above moved stock or reached the ledger
    assert_eq!(stock_of(&service, &coxinha.id).await, 10);
    assert!(service.consumptions_for_employee(&ana.id).await.is_empty());
    assert_eq!(service.total_pending_amount().await, Money::zero());
}

#[tokio::test]
async fn test_missing_entries_are_not_found() {
    let service = start().await;
    let coxinha = product(&service, "Coxinha", 650, 10).await;

    let err = service
        .edit_consumption("missing", vec![ItemRequest::new(&coxinha.id, 1)], now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service.delete_consumption("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service.revert_payment("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Payment Reversal
// =============================================================================

#[tokio::test]
async fn test_revert_reopens_a_settled_entry() {
    let service = start().await;
    let (ana, first_id, _) = two_tabs(&service).await;
    service
        .record_payment(&ana.id, Money::from_cents(1000), PaymentMethod::Cash)
        .await
        .unwrap();

    let plan = service.revert_payment(&first_id).await.unwrap();
    assert!(matches!(plan, RevertPlan::Reopen(_)));

    let first = service
        .database()
        .consumptions()
        .get_by_id(&first_id)
        .await
        .unwrap()
        .unwrap();
    assert!(first.is_pending());
    assert_eq!(
        service.pending_total_for_employee(&ana.id).await,
        Money::from_cents(2500)
    );
}

#[tokio::test]
async fn test_revert_pending_is_invalid_state() {
    let service = start().await;
    let (_, first_id, _) = two_tabs(&service).await;

    let err = service.revert_payment(&first_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_revert_carve_out_keeps_adjustment_by_default() {
    let service = start().await;
    let (ana, _, second_id) = two_tabs(&service).await;
    let settled = service
        .record_payment(&ana.id, Money::from_cents(1200), PaymentMethod::Pix)
        .await
        .unwrap();
    let carve_out_id = settled[1].id.clone();

    let plan = service.revert_payment(&carve_out_id).await.unwrap();
    assert!(matches!(
        plan,
        RevertPlan::DeleteCarveOut { restored_source: None, .. }
    ));

    let consumptions = service.database().consumptions();
    assert!(consumptions.get_by_id(&carve_out_id).await.unwrap().is_none());
    let second = consumptions.get_by_id(&second_id).await.unwrap().unwrap();
    assert_eq!(second.total(), Money::from_cents(1300));
}

#[tokio::test]
async fn test_revert_carve_out_can_restore_adjustment() {
    let mut config = LedgerConfig::default();
    config.ledger.partial_reversal = PartialReversalPolicy::RestoreAdjustment;
    let service = start_with(config).await;

    let (ana, _, second_id) = two_tabs(&service).await;
    let settled = service
        .record_payment(&ana.id, Money::from_cents(1200), PaymentMethod::Pix)
        .await
        .unwrap();
    let carve_out_id = settled[1].id.clone();

    service.revert_payment(&carve_out_id).await.unwrap();

    let consumptions = service.database().consumptions();
    assert!(consumptions.get_by_id(&carve_out_id).await.unwrap().is_none());
    let second = consumptions.get_by_id(&second_id).await.unwrap().unwrap();
    assert_eq!(second.total(), Money::from_cents(1500));
    assert!(second.is_pending());
}

#[tokio::test]
async fn test_settled_edits_can_be_disabled() {
    let mut config = LedgerConfig::default();
    config.ledger.allow_settled_edits = false;
    let service = start_with(config).await;

    let coxinha = product(&service, "Coxinha", 650, 10).await;
    let sale = service
        .add_walk_in_sale(
            vec![ItemRequest::new(&coxinha.id, 1)],
            days_ago(0),
            PaymentMethod::Cash,
        )
        .await
        .unwrap();

    let err = service
        .edit_consumption(&sale.id, vec![ItemRequest::new(&coxinha.id, 2)], sale.date)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(stock_of(&service, &coxinha.id).await, 9);
}

// =============================================================================
// Parties & Catalog
// =============================================================================

#[tokio::test]
async fn test_delete_employee_requires_no_entries() {
    let service = start().await;
    let (ana, _, _) = two_tabs(&service).await;

    let err = service.delete_employee(&ana.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    let bruno = service
        .add_employee("Bruno Lima", "", &ana.company_id)
        .await
        .unwrap();
    service.delete_employee(&bruno.id).await.unwrap();

    let err = service.delete_employee(&bruno.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_company_requires_no_employees() {
    let service = start().await;
    let ana = employee(&service).await;

    let err = service.delete_company(&ana.company_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    service.delete_employee(&ana.id).await.unwrap();
    service.delete_company(&ana.company_id).await.unwrap();
}

#[tokio::test]
async fn test_walk_in_party_is_protected() {
    let service = start().await;

    let err = service.delete_employee(WALK_IN_EMPLOYEE_ID).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    let err = service.delete_company(WALK_IN_COMPANY_ID).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

    let err = service
        .update_employee(WALK_IN_EMPLOYEE_ID, "Someone", "", WALK_IN_COMPANY_ID)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
}

#[tokio::test]
async fn test_employee_needs_an_existing_company() {
    let service = start().await;

    let err = service
        .add_employee("Ana", "", "no-such-company")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let ana = employee(&service).await;
    let other = service.add_company("Globex").await.unwrap();
    let moved = service
        .update_employee(&ana.id, "Ana Souza", "5511990000009", &other.id)
        .await
        .unwrap();
    assert_eq!(moved.company_id, other.id);

    let err = service
        .update_employee(&ana.id, "Ana Souza", "", "no-such-company")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_catalog_edits_do_not_reprice_entries() {
    let service = start().await;
    let ana = employee(&service).await;
    let coxinha = product(&service, "Coxinha", 650, 10).await;

    let entry = service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new(&coxinha.id, 2)],
            days_ago(0),
        ))
        .await
        .unwrap();

    let edited = service
        .edit_product(&coxinha.id, "Coxinha grande", Money::from_cents(900), Category::Snack, 8)
        .await
        .unwrap();
    assert_eq!(edited.name, "Coxinha grande");

    assert_eq!(
        service.pending_total_for_employee(&ana.id).await,
        entry.total()
    );

    let err = service
        .add_product("Free lunch", Money::zero(), Category::Food, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = service
        .edit_product("missing", "X", Money::from_cents(100), Category::Food, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleted_product_is_reported_as_missing() {
    let service = start().await;
    let coxinha = product(&service, "Coxinha", 650, 10).await;

    service
        .add_walk_in_sale(
            vec![ItemRequest::new(&coxinha.id, 3)],
            days_ago(0),
            PaymentMethod::Pix,
        )
        .await
        .unwrap();
    service.delete_product(&coxinha.id).await.unwrap();

    let best = service.best_selling_products(None).await;
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].name, "N/A");
    assert_eq!(best[0].quantity, 3);
    assert_eq!(best[0].total, Money::from_cents(1950));

    let err = service.delete_product(&coxinha.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// Projections
// =============================================================================

#[tokio::test]
async fn test_walk_in_sales_count_as_revenue() {
    let service = start().await;
    let suco = product(&service, "Suco", 800, 10).await;

    let sale = service
        .add_walk_in_sale(
            vec![ItemRequest::new(&suco.id, 2)],
            days_ago(0),
            PaymentMethod::Card,
        )
        .await
        .unwrap();

    assert_eq!(sale.employee_id, WALK_IN_EMPLOYEE_ID);
    assert!(sale.is_settled());
    assert_eq!(stock_of(&service, &suco.id).await, 8);
    assert_eq!(service.monthly_revenue(None).await, Money::from_cents(1600));
    assert!(service.total_pending_amount().await.is_zero());

    let guests = service.consumptions_for_employee(WALK_IN_EMPLOYEE_ID).await;
    assert_eq!(guests.len(), 1);

    let performance = service.company_performance(None).await;
    assert_eq!(performance[0].company_id, WALK_IN_COMPANY_ID);
    assert_eq!(performance[0].total_sales, Money::from_cents(1600));
}

#[tokio::test]
async fn test_company_and_category_reports() {
    let service = start().await;
    let (ana, _, _) = two_tabs(&service).await;
    let bruno = service
        .add_employee("Bruno Lima", "", &ana.company_id)
        .await
        .unwrap();
    let suco = service
        .add_product("Suco", Money::from_cents(800), Category::Drink, 10)
        .await
        .unwrap();
    service
        .add_consumption(ConsumptionDraft::new(
            &bruno.id,
            vec![ItemRequest::new(&suco.id, 1)],
            days_ago(0),
        ))
        .await
        .unwrap();

    assert_eq!(
        service.pending_total_for_company(&ana.company_id).await,
        Money::from_cents(3300)
    );

    service
        .record_payment(&ana.id, Money::from_cents(2500), PaymentMethod::Pix)
        .await
        .unwrap();
    service
        .record_payment(&bruno.id, Money::from_cents(800), PaymentMethod::Cash)
        .await
        .unwrap();

    let performance = service.company_performance(None).await;
    assert_eq!(performance[0].company_id, ana.company_id);
    assert_eq!(performance[0].total_sales, Money::from_cents(3300));

    let categories = service.sales_by_category(None).await;
    assert_eq!(categories.len(), 4);
    assert_eq!(categories[0].category, Category::Snack);
    assert_eq!(categories[0].total, Money::from_cents(2500));
    assert_eq!(categories[1].category, Category::Drink);
    assert_eq!(categories[1].total, Money::from_cents(800));
}

#[tokio::test]
async fn test_receipt_lines_for_a_payment() {
    let service = start().await;
    let (ana, _, _) = two_tabs(&service).await;

    let settled = service
        .record_payment(&ana.id, Money::from_cents(1200), PaymentMethod::Pix)
        .await
        .unwrap();
    let lines = service.receipt_lines(&settled).await;

    let printed: Vec<String> = lines.iter().map(ToString::to_string).collect();
    assert_eq!(
        printed,
        vec![
            "1x Marmita (10.00) = 10.00".to_string(),
            "1x Partial payment (2.00) = 2.00".to_string(),
        ]
    );
}

// =============================================================================
// Snapshot
// =============================================================================

#[tokio::test]
async fn test_reporting_window_limits_settled_history() {
    let service = start().await;
    let coxinha = product(&service, "Coxinha", 650, 10).await;
    let sale = service
        .add_walk_in_sale(
            vec![ItemRequest::new(&coxinha.id, 1)],
            days_ago(1),
            PaymentMethod::Pix,
        )
        .await
        .unwrap();
    let ana = employee(&service).await;
    let tab = service
        .add_consumption(ConsumptionDraft::new(
            &ana.id,
            vec![ItemRequest::new(&coxinha.id, 1)],
            days_ago(1),
        ))
        .await
        .unwrap();

    let long_ago = Period::new(days_ago(400), days_ago(300));
    service.set_reporting_window(long_ago).await.unwrap();

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.window, long_ago);
    assert!(snapshot.consumption(&sale.id).is_none());
    assert!(snapshot.consumption(&tab.id).is_some());

    let err = service
        .set_reporting_window(Period::new(days_ago(1), days_ago(2)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(service.reporting_window().await, long_ago);

    service.reset_reporting_window().await.unwrap();
    assert!(service.snapshot().await.consumption(&sale.id).is_some());
}

#[tokio::test]
async fn test_snapshot_follows_commits_made_elsewhere() {
    let service = start().await;

    let product = Product {
        id: "p-external".to_string(),
        name: "Pastel".to_string(),
        price: Money::from_cents(700),
        category: Category::Snack,
        stock: 4,
    };
    let mut batch = WriteBatch::new();
    batch.push(WriteOp::PutProduct(product.clone()));
    let seq = service.database().commit(batch).await.unwrap();

    let mut seen = false;
    for _ in 0..100 {
        let snapshot = service.snapshot().await;
        if snapshot.seq >= seq && snapshot.product(&product.id).is_some() {
            seen = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(seen, "watcher did not pick up the external commit");

    service.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_is_current_after_own_commit() {
    let service = start().await;
    let ana = employee(&service).await;

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.seq, service.database().commit_seq());
    assert!(snapshot.employee(&ana.id).is_some());
    assert!(snapshot.employee(WALK_IN_EMPLOYEE_ID).is_some());
}
