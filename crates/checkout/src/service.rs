//! Checkout orchestration and the void workflow.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{InvoiceId, OrderId, SaleId};
use domain::{
    Checkout, DomainError, InvoiceStatus, LineItem, Money, OrderStatus, Period, SaleStatus,
    VoidInvoice,
};
use store::{
    CheckoutRecord, InvoiceRecord, OrderRecord, SaleRecord, Store, StoreError, StoreTx, VoidStamp,
};

use crate::error::{CheckoutError, Result};
use crate::ledger::InventoryLedger;
use crate::sequence::SequenceGenerator;

/// Result of a checkout call.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// The committed checkout.
    pub record: CheckoutRecord,

    /// True when the idempotency key matched an earlier checkout and nothing
    /// new was written.
    pub replayed: bool,
}

/// Converts carts into sales, invoices and fulfillment orders, and reverses them.
///
/// Each call runs in exactly one store transaction. Any error rolls the
/// whole transaction back before it is returned.
pub struct CheckoutService<S: Store> {
    store: S,
    ledger: InventoryLedger,
    sequence: SequenceGenerator,
}

impl<S: Store> CheckoutService<S> {
    /// Creates a new checkout service.
    pub fn new(store: S) -> Self {
        Self {
            store,
            ledger: InventoryLedger,
            sequence: SequenceGenerator,
        }
    }

    /// Gets a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs a checkout stamped with the current time.
    pub async fn checkout(&self, cmd: Checkout) -> Result<CheckoutOutcome> {
        self.checkout_at(cmd, Utc::now()).await
    }

    /// Runs a checkout as if it happened at `now`.
    ///
    /// `now` decides the invoice period and every record's creation time.
    #[tracing::instrument(
        skip(self, cmd),
        fields(idempotency_key = %cmd.idempotency_key, lines = cmd.lines.len())
    )]
    pub async fn checkout_at(&self, cmd: Checkout, now: DateTime<Utc>) -> Result<CheckoutOutcome> {
        metrics::counter!("checkout_total").increment(1);
        let start = Instant::now();

        let result = self.run_checkout(&cmd, now).await;

        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(outcome) if outcome.replayed => {
                metrics::counter!("checkout_replayed").increment(1);
                tracing::info!(invoice = %outcome.record.invoice.number, "checkout replayed");
            }
            Ok(outcome) => {
                metrics::counter!("checkout_committed").increment(1);
                tracing::info!(
                    invoice = %outcome.record.invoice.number,
                    total = %outcome.record.sale.total,
                    "checkout committed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_rejected", "reason" => e.reason()).increment(1);
                tracing::warn!(error = %e, "checkout rejected");
            }
        }

        result
    }

    async fn run_checkout(&self, cmd: &Checkout, now: DateTime<Utc>) -> Result<CheckoutOutcome> {
        cmd.validate()?;

        let mut tx = self.store.begin().await?;

        // Concurrent retries of one request queue here, so a retry only reads
        // the key after the earlier attempt has committed or rolled back.
        tx.lock_dedup_key(&cmd.idempotency_key).await?;

        if let Some(existing) = tx.find_checkout_by_dedup_key(&cmd.idempotency_key).await? {
            tx.rollback().await?;
            return replay(cmd, existing);
        }

        let record = match self.write_checkout(&mut tx, cmd, now).await {
            Ok(record) => record,
            Err(CheckoutError::Store(StoreError::DuplicateDedupKey(_))) => {
                // A concurrent checkout with the same key committed first.
                tx.rollback().await?;
                return self.reload_winner(cmd).await;
            }
            Err(e) => return Err(e),
        };

        match tx.commit().await {
            Ok(()) => Ok(CheckoutOutcome {
                record,
                replayed: false,
            }),
            Err(StoreError::DuplicateDedupKey(_)) => self.reload_winner(cmd).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Validates against the catalog, reserves stock and writes every record.
    async fn write_checkout(
        &self,
        tx: &mut S::Tx,
        cmd: &Checkout,
        now: DateTime<Utc>,
    ) -> Result<CheckoutRecord> {
        if !tx.customer_exists(cmd.customer_id).await? {
            return Err(CheckoutError::CustomerNotFound(cmd.customer_id));
        }

        let mut lines = Vec::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            let sku = tx
                .find_sku(&line.sku_id)
                .await?
                .ok_or_else(|| CheckoutError::SkuNotFound(line.sku_id.clone()))?;
            if !sku.active {
                return Err(CheckoutError::SkuInactive(sku.id));
            }
            let unit_price = line.unit_price.unwrap_or(sku.unit_price);
            lines.push(LineItem::new(line.sku_id.clone(), line.quantity, unit_price));
        }

        let subtotals = lines
            .iter()
            .map(LineItem::checked_subtotal)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let total = Money::checked_sum(subtotals).ok_or_else(|| {
            DomainError::AmountOverflow(format!("cart total for {}", cmd.idempotency_key))
        })?;
        if let Some(declared) = cmd.declared_total
            && declared != total
        {
            return Err(CheckoutError::TotalMismatch {
                declared,
                computed: total,
            });
        }

        // Ascending SKU order keeps lock acquisition consistent across carts.
        for (sku_id, quantity) in cmd.quantities_by_sku() {
            self.ledger.reserve(tx, &sku_id, quantity).await?;
        }

        let number = self.sequence.next(tx, Period::containing(now)).await?;

        let sale_id = SaleId::new();
        let invoice_id = InvoiceId::new();
        let customer_id = Some(cmd.customer_id);

        let record = CheckoutRecord {
            sale: SaleRecord {
                id: sale_id,
                customer_id,
                payment_method: cmd.payment_method,
                total,
                status: SaleStatus::Completed,
                created_at: now,
                voided_at: None,
            },
            invoice: InvoiceRecord {
                id: invoice_id,
                number,
                sale_id,
                customer_id,
                payment_method: cmd.payment_method,
                total,
                status: InvoiceStatus::Active,
                created_at: now,
                voided_at: None,
                void_reason: None,
                voided_by: None,
            },
            order: OrderRecord {
                id: OrderId::new(),
                sale_id,
                invoice_id,
                customer_id,
                total,
                status: OrderStatus::Pending,
                dedup_key: cmd.idempotency_key.clone(),
                delivery: cmd.delivery.clone(),
                created_at: now,
                voided_at: None,
            },
            lines,
        };

        tx.insert_checkout(&record).await?;
        Ok(record)
    }

    async fn reload_winner(&self, cmd: &Checkout) -> Result<CheckoutOutcome> {
        let mut tx = self.store.begin().await?;
        let existing = tx.find_checkout_by_dedup_key(&cmd.idempotency_key).await?;
        tx.rollback().await?;

        match existing {
            Some(existing) => replay(cmd, existing),
            None => Err(CheckoutError::Store(StoreError::Busy(format!(
                "checkout for key {} was not visible after a duplicate key error",
                cmd.idempotency_key
            )))),
        }
    }

    /// Reverses a committed checkout.
    ///
    /// Restores every sold unit and flips the invoice, sale and fulfillment
    /// order to voided together.
    #[tracing::instrument(skip(self, cmd), fields(invoice_id = %cmd.invoice_id))]
    pub async fn void(&self, cmd: VoidInvoice) -> Result<CheckoutRecord> {
        metrics::counter!("void_total").increment(1);

        let result = self.run_void(&cmd, Utc::now()).await;

        match &result {
            Ok(record) => {
                metrics::counter!("void_committed").increment(1);
                tracing::info!(invoice = %record.invoice.number, "invoice voided");
            }
            Err(e) => {
                metrics::counter!("void_rejected", "reason" => e.reason()).increment(1);
                tracing::warn!(error = %e, "void rejected");
            }
        }

        result
    }

    async fn run_void(&self, cmd: &VoidInvoice, now: DateTime<Utc>) -> Result<CheckoutRecord> {
        let mut tx = self.store.begin().await?;

        let record = tx
            .lock_checkout_by_invoice(cmd.invoice_id)
            .await?
            .ok_or(CheckoutError::InvoiceNotFound(cmd.invoice_id))?;

        if record.invoice.status == InvoiceStatus::Voided {
            return Err(CheckoutError::AlreadyVoided(record.invoice.number));
        }
        if !record.order.status.can_void() {
            return Err(CheckoutError::NotVoidable {
                invoice: record.invoice.number,
                status: record.order.status,
            });
        }
        if record.sale.status != SaleStatus::Completed {
            return Err(CheckoutError::Inconsistent(format!(
                "invoice {} is active but its sale is {}",
                record.invoice.number, record.sale.status
            )));
        }

        // Same ascending SKU order as checkout reservations.
        for (sku_id, quantity) in record.quantities_by_sku() {
            self.ledger.restore(&mut tx, &sku_id, quantity).await?;
        }

        let stamp = VoidStamp {
            at: now,
            reason: cmd.reason.clone(),
            voided_by: cmd.voided_by.clone(),
        };
        tx.mark_checkout_voided(&record, &stamp)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => CheckoutError::Inconsistent(msg),
                other => other.into(),
            })?;

        let voided = tx
            .find_checkout_by_invoice(cmd.invoice_id)
            .await?
            .ok_or(CheckoutError::InvoiceNotFound(cmd.invoice_id))?;

        tx.commit().await?;
        Ok(voided)
    }

    /// Loads a checkout through its invoice.
    #[tracing::instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: InvoiceId) -> Result<Option<CheckoutRecord>> {
        let mut tx = self.store.begin().await?;
        let record = tx.find_checkout_by_invoice(invoice_id).await?;
        tx.rollback().await?;
        Ok(record)
    }
}

/// Returns an earlier checkout if the retried request describes the same cart.
fn replay(cmd: &Checkout, existing: CheckoutRecord) -> Result<CheckoutOutcome> {
    if !same_cart(cmd, &existing) {
        return Err(CheckoutError::IdempotencyKeyReused(
            cmd.idempotency_key.clone(),
        ));
    }
    Ok(CheckoutOutcome {
        record: existing,
        replayed: true,
    })
}

fn same_cart(cmd: &Checkout, existing: &CheckoutRecord) -> bool {
    existing.sale.customer_id == Some(cmd.customer_id)
        && existing.sale.payment_method == cmd.payment_method
        && existing.quantities_by_sku() == cmd.quantities_by_sku()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{CustomerId, SkuId};
    use domain::{CheckoutLine, PaymentMethod};
    use store::{InMemoryStore, RecordCounts, SkuRecord};

    async fn setup() -> (CheckoutService<InMemoryStore>, InMemoryStore, CustomerId) {
        let store = InMemoryStore::new();
        let customer = CustomerId::new();
        store.insert_customer(customer, "Ada").await;
        store
            .upsert_sku(&SkuRecord::new("S1", "Shirt", 5, Money::from_cents(1000)))
            .await;
        store
            .upsert_sku(&SkuRecord::new("S2", "Socks", 10, Money::from_cents(250)))
            .await;
        (CheckoutService::new(store.clone()), store, customer)
    }

    fn cart(customer: CustomerId, key: &str, lines: Vec<CheckoutLine>) -> Checkout {
        Checkout::new(customer, PaymentMethod::Cash, lines, key)
    }

    fn march() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 10, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn test_happy_path() {
        let (service, store, customer) = setup().await;

        let outcome = service
            .checkout_at(
                cart(
                    customer,
                    "k1",
                    vec![CheckoutLine::new("S1", 2), CheckoutLine::new("S2", 3)],
                ),
                march(),
            )
            .await
            .unwrap();

        assert!(!outcome.replayed);
        let record = outcome.record;
        assert_eq!(record.invoice.number.to_string(), "F2026030001");
        assert_eq!(record.sale.total, Money::from_cents(2750));
        assert!(record.totals_agree());
        assert_eq!(record.order.status, OrderStatus::Pending);
        assert_eq!(record.order.dedup_key, "k1");
        assert_eq!(record.invoice.sale_id, record.sale.id);

        assert_eq!(store.available(&SkuId::new("S1")).await, Some(3));
        assert_eq!(store.available(&SkuId::new("S2")).await, Some(7));
    }

    #[tokio::test]
    async fn test_explicit_price_overrides_catalog() {
        let (service, _, customer) = setup().await;

        let outcome = service
            .checkout_at(
                cart(
                    customer,
                    "k1",
                    vec![CheckoutLine::priced("S1", 2, Money::from_cents(800))],
                )
                .with_declared_total(Money::from_cents(1600)),
                march(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.record.lines[0].unit_price, Money::from_cents(800));
        assert_eq!(outcome.record.invoice.total, Money::from_cents(1600));
    }

    #[tokio::test]
    async fn test_total_mismatch_leaves_nothing_behind() {
        let (service, store, customer) = setup().await;

        let err = service
            .checkout_at(
                cart(customer, "k1", vec![CheckoutLine::new("S1", 2)])
                    .with_declared_total(Money::from_cents(1999)),
                march(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::TotalMismatch { .. }));
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));
        assert_eq!(store.record_counts().await, RecordCounts::default());
    }

    #[tokio::test]
    async fn test_insufficient_stock_on_second_sku_rolls_back_first() {
        let (service, store, customer) = setup().await;

        let err = service
            .checkout_at(
                cart(
                    customer,
                    "k1",
                    vec![CheckoutLine::new("S1", 1), CheckoutLine::new("S2", 11)],
                ),
                march(),
            )
            .await
            .unwrap_err();

        match err {
            CheckoutError::InsufficientStock {
                sku_id, shortfall, ..
            } => {
                assert_eq!(sku_id, SkuId::new("S2"));
                assert_eq!(shortfall, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));
        assert_eq!(store.record_counts().await, RecordCounts::default());
    }

    #[tokio::test]
    async fn test_repeated_sku_lines_are_reserved_together() {
        let (service, store, customer) = setup().await;

        let err = service
            .checkout_at(
                cart(
                    customer,
                    "k1",
                    vec![CheckoutLine::new("S1", 3), CheckoutLine::new("S1", 3)],
                ),
                march(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                requested: 6,
                available: 5,
                shortfall: 1,
                ..
            }
        ));
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));
    }

    #[tokio::test]
    async fn test_unknown_customer_and_sku() {
        let (service, _, customer) = setup().await;

        let err = service
            .checkout_at(
                cart(CustomerId::new(), "k1", vec![CheckoutLine::new("S1", 1)]),
                march(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::CustomerNotFound(_)));

        let err = service
            .checkout_at(
                cart(customer, "k2", vec![CheckoutLine::new("S9", 1)]),
                march(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::SkuNotFound(ref s) if s.as_str() == "S9"));
    }

    #[tokio::test]
    async fn test_inactive_sku_is_rejected() {
        let (service, store, customer) = setup().await;
        store
            .upsert_sku(&SkuRecord::new("S3", "Hat", 4, Money::from_cents(900)).deactivated())
            .await;

        let err = service
            .checkout_at(
                cart(customer, "k1", vec![CheckoutLine::new("S3", 1)]),
                march(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::SkuInactive(_)));
        assert_eq!(store.available(&SkuId::new("S3")).await, Some(4));
    }

    #[tokio::test]
    async fn test_validation_runs_before_storage() {
        let (service, _, customer) = setup().await;

        let err = service
            .checkout_at(cart(customer, "k1", vec![]), march())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));

        let err = service
            .checkout_at(
                cart(customer, "k1", vec![CheckoutLine::new("S1", 0)]),
                march(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }

    #[tokio::test]
    async fn test_consecutive_invoice_numbers() {
        let (service, _, customer) = setup().await;

        let first = service
            .checkout_at(cart(customer, "a", vec![CheckoutLine::new("S2", 1)]), march())
            .await
            .unwrap();
        let second = service
            .checkout_at(cart(customer, "b", vec![CheckoutLine::new("S2", 1)]), march())
            .await
            .unwrap();

        let a = first.record.invoice.number;
        let b = second.record.invoice.number;
        assert_eq!(a.period(), b.period());
        assert_eq!(b.counter(), a.counter() + 1);
    }

    #[tokio::test]
    async fn test_failed_checkout_does_not_consume_a_number() {
        let (service, store, customer) = setup().await;

        store.set_fail_on_insert(true).await;
        let err = service
            .checkout_at(cart(customer, "a", vec![CheckoutLine::new("S1", 1)]), march())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Injected(_))));
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));

        store.set_fail_on_insert(false).await;
        let outcome = service
            .checkout_at(cart(customer, "a", vec![CheckoutLine::new("S1", 1)]), march())
            .await
            .unwrap();
        assert_eq!(outcome.record.invoice.number.counter(), 1);
    }

    #[tokio::test]
    async fn test_idempotent_replay() {
        let (service, store, customer) = setup().await;
        let cmd = cart(customer, "retry-me", vec![CheckoutLine::new("S1", 2)]);

        let first = service.checkout_at(cmd.clone(), march()).await.unwrap();
        let second = service.checkout_at(cmd, march()).await.unwrap();

        assert!(!first.replayed);
        assert!(second.replayed);
        assert_eq!(first.record, second.record);
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(3));
        assert_eq!(store.record_counts().await.orders, 1);
    }

    #[tokio::test]
    async fn test_key_reuse_with_different_cart_is_rejected() {
        let (service, store, customer) = setup().await;

        service
            .checkout_at(cart(customer, "k", vec![CheckoutLine::new("S1", 2)]), march())
            .await
            .unwrap();
        let err = service
            .checkout_at(cart(customer, "k", vec![CheckoutLine::new("S1", 3)]), march())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::IdempotencyKeyReused(_)));
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(3));
    }

    #[tokio::test]
    async fn test_void_round_trip() {
        let (service, store, customer) = setup().await;
        let outcome = service
            .checkout_at(
                cart(
                    customer,
                    "k1",
                    vec![CheckoutLine::new("S1", 2), CheckoutLine::new("S2", 4)],
                ),
                march(),
            )
            .await
            .unwrap();
        let invoice_id = outcome.record.invoice.id;

        let voided = service
            .void(VoidInvoice::new(invoice_id).with_reason("wrong size").by("clerk-1"))
            .await
            .unwrap();

        assert_eq!(voided.invoice.status, InvoiceStatus::Voided);
        assert_eq!(voided.sale.status, SaleStatus::Voided);
        assert_eq!(voided.order.status, OrderStatus::Voided);
        assert_eq!(voided.invoice.void_reason.as_deref(), Some("wrong size"));
        assert_eq!(voided.invoice.voided_by.as_deref(), Some("clerk-1"));
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));
        assert_eq!(store.available(&SkuId::new("S2")).await, Some(10));

        let err = service.void(VoidInvoice::new(invoice_id)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::AlreadyVoided(_)));
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));
    }

    #[tokio::test]
    async fn test_void_restores_repeated_sku_lines() {
        let (service, store, customer) = setup().await;
        let outcome = service
            .checkout_at(
                cart(
                    customer,
                    "k1",
                    vec![
                        CheckoutLine::new("S2", 1),
                        CheckoutLine::new("S1", 2),
                        CheckoutLine::new("S2", 3),
                    ],
                ),
                march(),
            )
            .await
            .unwrap();
        assert_eq!(store.available(&SkuId::new("S2")).await, Some(6));

        service
            .void(VoidInvoice::new(outcome.record.invoice.id))
            .await
            .unwrap();

        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));
        assert_eq!(store.available(&SkuId::new("S2")).await, Some(10));
    }

    #[tokio::test]
    async fn test_amount_overflow_is_rejected_without_side_effects() {
        let (service, store, customer) = setup().await;

        let err = service
            .checkout_at(
                cart(
                    customer,
                    "k1",
                    vec![CheckoutLine::priced("S1", 3, Money::from_cents(i64::MAX / 2))],
                ),
                march(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(DomainError::AmountOverflow(_))
        ));

        let err = service
            .checkout_at(
                cart(
                    customer,
                    "k2",
                    vec![
                        CheckoutLine::priced("S1", 1, Money::from_cents(i64::MAX)),
                        CheckoutLine::priced("S2", 1, Money::from_cents(1)),
                    ],
                ),
                march(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(DomainError::AmountOverflow(_))
        ));

        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));
        assert_eq!(store.record_counts().await, RecordCounts::default());
    }

    #[tokio::test]
    async fn test_merged_quantity_over_limit_is_rejected() {
        let (service, store, customer) = setup().await;

        let err = service
            .checkout_at(
                cart(
                    customer,
                    "k1",
                    vec![CheckoutLine::new("S1", u32::MAX), CheckoutLine::new("S1", 2)],
                ),
                march(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Validation(DomainError::QuantityTooLarge { .. })
        ));
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(5));
    }

    #[tokio::test]
    async fn test_void_unknown_invoice() {
        let (service, _, _) = setup().await;
        let err = service
            .void(VoidInvoice::new(InvoiceId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvoiceNotFound(_)));
    }

    #[tokio::test]
    async fn test_delivered_order_cannot_be_voided() {
        let (service, store, customer) = setup().await;
        let outcome = service
            .checkout_at(cart(customer, "k1", vec![CheckoutLine::new("S1", 1)]), march())
            .await
            .unwrap();
        store
            .set_order_status(outcome.record.order.id, OrderStatus::Delivered)
            .await;

        let err = service
            .void(VoidInvoice::new(outcome.record.invoice.id))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::NotVoidable {
                status: OrderStatus::Delivered,
                ..
            }
        ));
        assert_eq!(store.available(&SkuId::new("S1")).await, Some(4));
    }

    #[tokio::test]
    async fn test_get_invoice() {
        let (service, _, customer) = setup().await;
        let outcome = service
            .checkout_at(cart(customer, "k1", vec![CheckoutLine::new("S1", 1)]), march())
            .await
            .unwrap();

        let found = service
            .get_invoice(outcome.record.invoice.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, outcome.record);
        assert!(service.get_invoice(InvoiceId::new()).await.unwrap().is_none());
    }
}
