//! Checkout concurrency tests against PostgreSQL.
//!
//! Run with:
//!
//! ```bash
//! cargo test -p checkout --test postgres_checkout -- --test-threads=1
//! ```

use std::sync::Arc;

use checkout::{CheckoutError, CheckoutService};
use common::{CustomerId, SkuId};
use domain::{
    Checkout, CheckoutLine, InvoiceStatus, Money, OrderStatus, PaymentMethod, VoidInvoice,
};
use sqlx::PgPool;
use store::{PostgresStore, RecordCounts, SkuRecord};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_checkout_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

struct TestHarness {
    service: Arc<CheckoutService<PostgresStore>>,
    store: PostgresStore,
    customer: CustomerId,
}

impl TestHarness {
    async fn new(s1_available: i64) -> Self {
        let info = get_container_info().await;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(20)
            .connect(&info.connection_string)
            .await
            .unwrap();

        sqlx::query(
            "TRUNCATE TABLE invoice_line_items, sale_line_items, fulfillment_orders, invoices, \
             sales, invoice_sequences, skus, customers",
        )
        .execute(&pool)
        .await
        .unwrap();

        let store = PostgresStore::new(pool);
        let customer = CustomerId::new();
        store.insert_customer(customer, "Grace").await.unwrap();
        store
            .upsert_sku(&SkuRecord::new(
                "S1",
                "Shirt",
                s1_available,
                Money::from_cents(1500),
            ))
            .await
            .unwrap();
        store
            .upsert_sku(&SkuRecord::new("S2", "Socks", 100, Money::from_cents(300)))
            .await
            .unwrap();

        Self {
            service: Arc::new(CheckoutService::new(store.clone())),
            store,
            customer,
        }
    }

    fn cart(&self, key: &str, lines: Vec<CheckoutLine>) -> Checkout {
        Checkout::new(self.customer, PaymentMethod::CreditCard, lines, key)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_do_not_oversell() {
    let h = TestHarness::new(5).await;

    let a = {
        let service = h.service.clone();
        let cmd = h.cart("A", vec![CheckoutLine::new("S1", 3)]);
        tokio::spawn(async move { service.checkout(cmd).await })
    };
    let b = {
        let service = h.service.clone();
        let cmd = h.cart("B", vec![CheckoutLine::new("S1", 4)]);
        tokio::spawn(async move { service.checkout(cmd).await })
    };

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    let available = h.store.available(&SkuId::new("S1")).await.unwrap().unwrap();

    match (a, b) {
        (Ok(_), Err(CheckoutError::InsufficientStock { shortfall, .. })) => {
            assert_eq!(shortfall, 2);
            assert_eq!(available, 2);
        }
        (Err(CheckoutError::InsufficientStock { shortfall, .. }), Ok(_)) => {
            assert_eq!(shortfall, 2);
            assert_eq!(available, 1);
        }
        other => panic!("exactly one checkout must succeed: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_get_distinct_consecutive_numbers() {
    let h = TestHarness::new(5).await;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = h.service.clone();
            let cmd = h.cart(&format!("key-{i}"), vec![CheckoutLine::new("S2", 1)]);
            tokio::spawn(async move { service.checkout(cmd).await })
        })
        .collect();

    let mut counters: Vec<u32> = futures_util::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap().record.invoice.number.counter())
        .collect();
    counters.sort_unstable();

    assert_eq!(counters, (1..=10).collect::<Vec<u32>>());
    assert_eq!(h.store.available(&SkuId::new("S2")).await.unwrap(), Some(90));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn crossing_carts_do_not_deadlock() {
    let h = TestHarness::new(50).await;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = h.service.clone();
            // Half the carts list S2 first, half list S1 first.
            let lines = if i % 2 == 0 {
                vec![CheckoutLine::new("S2", 1), CheckoutLine::new("S1", 1)]
            } else {
                vec![CheckoutLine::new("S1", 1), CheckoutLine::new("S2", 1)]
            };
            let cmd = h.cart(&format!("cross-{i}"), lines);
            tokio::spawn(async move { service.checkout(cmd).await })
        })
        .collect();

    for result in futures_util::future::join_all(handles).await {
        result.unwrap().unwrap();
    }
    assert_eq!(h.store.available(&SkuId::new("S1")).await.unwrap(), Some(40));
    assert_eq!(h.store.available(&SkuId::new("S2")).await.unwrap(), Some(90));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_retries_commit_once() {
    // Only enough stock for one cart: a retry that reserved instead of
    // replaying would fail with insufficient stock.
    let h = TestHarness::new(2).await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let service = h.service.clone();
            let cmd = h.cart("same-key", vec![CheckoutLine::new("S1", 2)]);
            tokio::spawn(async move { service.checkout(cmd).await })
        })
        .collect();

    let outcomes: Vec<_> = futures_util::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    assert_eq!(outcomes.iter().filter(|o| !o.replayed).count(), 1);
    let number = outcomes[0].record.invoice.number;
    assert!(outcomes.iter().all(|o| o.record.invoice.number == number));
    assert_eq!(h.store.available(&SkuId::new("S1")).await.unwrap(), Some(0));
    assert_eq!(h.store.record_counts().await.unwrap().orders, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn voids_and_checkouts_on_crossing_skus_do_not_deadlock() {
    let h = TestHarness::new(50).await;

    // Sold with S2 listed before S1.
    let mut invoices = Vec::new();
    for i in 0..5 {
        let outcome = h
            .service
            .checkout(h.cart(
                &format!("sold-{i}"),
                vec![CheckoutLine::new("S2", 1), CheckoutLine::new("S1", 1)],
            ))
            .await
            .unwrap();
        invoices.push(outcome.record.invoice.id);
    }

    let voids: Vec<_> = invoices
        .into_iter()
        .map(|invoice_id| {
            let service = h.service.clone();
            tokio::spawn(async move {
                service.void(VoidInvoice::new(invoice_id)).await.map(|_| ())
            })
        })
        .collect();
    let checkouts: Vec<_> = (0..5)
        .map(|i| {
            let service = h.service.clone();
            let cmd = h.cart(
                &format!("new-{i}"),
                vec![CheckoutLine::new("S1", 1), CheckoutLine::new("S2", 1)],
            );
            tokio::spawn(async move { service.checkout(cmd).await.map(|_| ()) })
        })
        .collect();

    for result in futures_util::future::join_all(voids.into_iter().chain(checkouts)).await {
        result.unwrap().unwrap();
    }
    assert_eq!(h.store.available(&SkuId::new("S1")).await.unwrap(), Some(45));
    assert_eq!(h.store.available(&SkuId::new("S2")).await.unwrap(), Some(95));
}

#[tokio::test]
async fn failed_checkout_leaves_no_rows() {
    let h = TestHarness::new(5).await;

    let err = h
        .service
        .checkout(h.cart(
            "too-many",
            vec![CheckoutLine::new("S2", 1), CheckoutLine::new("S1", 6)],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
    assert_eq!(h.store.record_counts().await.unwrap(), RecordCounts::default());
    assert_eq!(h.store.available(&SkuId::new("S2")).await.unwrap(), Some(100));
}

#[tokio::test]
async fn void_restores_stock_and_rejects_second_void() {
    let h = TestHarness::new(5).await;

    let outcome = h
        .service
        .checkout(h.cart(
            "to-void",
            vec![CheckoutLine::new("S1", 3), CheckoutLine::new("S2", 2)],
        ))
        .await
        .unwrap();
    let invoice_id = outcome.record.invoice.id;

    let voided = h
        .service
        .void(VoidInvoice::new(invoice_id).with_reason("duplicate sale"))
        .await
        .unwrap();
    assert_eq!(voided.invoice.status, InvoiceStatus::Voided);
    assert_eq!(voided.order.status, OrderStatus::Voided);
    assert_eq!(h.store.available(&SkuId::new("S1")).await.unwrap(), Some(5));
    assert_eq!(h.store.available(&SkuId::new("S2")).await.unwrap(), Some(100));

    let err = h.service.void(VoidInvoice::new(invoice_id)).await.unwrap_err();
    assert!(matches!(err, CheckoutError::AlreadyVoided(_)));
    assert_eq!(h.store.available(&SkuId::new("S1")).await.unwrap(), Some(5));
}
