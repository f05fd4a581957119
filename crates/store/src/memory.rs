use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{CustomerId, InvoiceId, OrderId, SkuId};
use domain::{InvoiceNumber, InvoiceStatus, OrderStatus, Period, SaleStatus};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    CheckoutRecord, RecordCounts, Result, SkuRecord, StockChange, StoreError, VoidStamp,
    store::{DEFAULT_LOCK_TIMEOUT, Store, StoreTx},
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    customers: HashMap<CustomerId, String>,
    skus: HashMap<SkuId, SkuRecord>,
    counters: HashMap<Period, u32>,
    checkouts: Vec<CheckoutRecord>,
    fail_on_insert: bool,
}

impl MemoryState {
    fn checkout_by_invoice(&self, id: InvoiceId) -> Option<&CheckoutRecord> {
        self.checkouts.iter().find(|c| c.invoice.id == id)
    }
}

/// In-memory store implementation for testing.
///
/// A transaction takes an exclusive lock over the whole store and works on a
/// private copy of it; commit swaps the copy in, drop discards it. This gives
/// the same all-or-nothing and no-oversell guarantees as the PostgreSQL
/// implementation, at the cost of serializing every transaction.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    lock_timeout: Duration,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long `begin` waits for the store lock before failing.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Registers a customer in the directory.
    pub async fn insert_customer(&self, id: CustomerId, name: &str) {
        self.state
            .lock()
            .await
            .customers
            .entry(id)
            .or_insert_with(|| name.to_string());
    }

    /// Creates or replaces a catalog SKU.
    pub async fn upsert_sku(&self, sku: &SkuRecord) {
        self.state.lock().await.skus.insert(sku.id.clone(), sku.clone());
    }

    /// Returns the committed available quantity of a SKU.
    pub async fn available(&self, id: &SkuId) -> Option<i64> {
        self.state.lock().await.skus.get(id).map(|s| s.available)
    }

    /// Moves a fulfillment order to another status outside of checkout.
    pub async fn set_order_status(&self, id: OrderId, status: OrderStatus) {
        let mut state = self.state.lock().await;
        if let Some(checkout) = state.checkouts.iter_mut().find(|c| c.order.id == id) {
            checkout.order.status = status;
        }
    }

    /// Configures the store to fail when the next checkout rows are inserted.
    pub async fn set_fail_on_insert(&self, fail: bool) {
        self.state.lock().await.fail_on_insert = fail;
    }

    /// Counts committed checkout rows per table.
    pub async fn record_counts(&self) -> RecordCounts {
        let state = self.state.lock().await;
        let lines: i64 = state.checkouts.iter().map(|c| c.lines.len() as i64).sum();
        let count = state.checkouts.len() as i64;
        RecordCounts {
            sales: count,
            sale_lines: lines,
            invoices: count,
            invoice_lines: lines,
            orders: count,
        }
    }

    /// Returns every committed checkout in commit order.
    pub async fn checkouts(&self) -> Vec<CheckoutRecord> {
        self.state.lock().await.checkouts.clone()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        let guard = tokio::time::timeout(self.lock_timeout, self.state.clone().lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout)?;
        let working = guard.clone();
        Ok(InMemoryTx { guard, working })
    }
}

/// An open in-memory transaction.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn commit(self) -> Result<()> {
        let InMemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }

    async fn customer_exists(&mut self, id: CustomerId) -> Result<bool> {
        Ok(self.working.customers.contains_key(&id))
    }

    async fn find_sku(&mut self, id: &SkuId) -> Result<Option<SkuRecord>> {
        Ok(self.working.skus.get(id).cloned())
    }

    async fn decrement_stock(&mut self, id: &SkuId, quantity: u32) -> Result<StockChange> {
        let Some(sku) = self.working.skus.get_mut(id) else {
            return Ok(StockChange::UnknownSku);
        };
        let quantity = i64::from(quantity);
        if sku.available < quantity {
            return Ok(StockChange::Insufficient {
                available: sku.available,
            });
        }
        sku.available -= quantity;
        Ok(StockChange::Applied {
            available: sku.available,
        })
    }

    async fn increment_stock(&mut self, id: &SkuId, quantity: u32) -> Result<StockChange> {
        let Some(sku) = self.working.skus.get_mut(id) else {
            return Ok(StockChange::UnknownSku);
        };
        sku.available += i64::from(quantity);
        Ok(StockChange::Applied {
            available: sku.available,
        })
    }

    async fn advance_invoice_counter(&mut self, period: Period) -> Result<u32> {
        let seed = self
            .working
            .checkouts
            .iter()
            .map(|c| c.invoice.number)
            .filter(|n| n.period() == period)
            .map(|n| n.counter())
            .max()
            .unwrap_or(0);

        let counter = self.working.counters.entry(period).or_insert(seed);
        *counter += 1;
        Ok(*counter)
    }

    async fn lock_dedup_key(&mut self, _dedup_key: &str) -> Result<()> {
        // The whole store is already held exclusively.
        Ok(())
    }

    async fn find_checkout_by_dedup_key(
        &mut self,
        dedup_key: &str,
    ) -> Result<Option<CheckoutRecord>> {
        Ok(self
            .working
            .checkouts
            .iter()
            .find(|c| c.order.dedup_key == dedup_key)
            .cloned())
    }

    async fn find_checkout_by_invoice(&mut self, id: InvoiceId) -> Result<Option<CheckoutRecord>> {
        Ok(self.working.checkout_by_invoice(id).cloned())
    }

    async fn lock_checkout_by_invoice(&mut self, id: InvoiceId) -> Result<Option<CheckoutRecord>> {
        // The whole store is already held exclusively.
        Ok(self.working.checkout_by_invoice(id).cloned())
    }

    async fn insert_checkout(&mut self, record: &CheckoutRecord) -> Result<()> {
        if self.working.fail_on_insert {
            return Err(StoreError::Injected("insert_checkout".to_string()));
        }

        let numbers: HashSet<InvoiceNumber> =
            self.working.checkouts.iter().map(|c| c.invoice.number).collect();
        if numbers.contains(&record.invoice.number) {
            return Err(StoreError::DuplicateInvoiceNumber(
                record.invoice.number.to_string(),
            ));
        }
        if self
            .working
            .checkouts
            .iter()
            .any(|c| c.order.dedup_key == record.order.dedup_key)
        {
            return Err(StoreError::DuplicateDedupKey(record.order.dedup_key.clone()));
        }

        self.working.checkouts.push(record.clone());
        Ok(())
    }

    async fn mark_checkout_voided(
        &mut self,
        record: &CheckoutRecord,
        stamp: &VoidStamp,
    ) -> Result<()> {
        let checkout = self
            .working
            .checkouts
            .iter_mut()
            .find(|c| c.invoice.id == record.invoice.id)
            .ok_or_else(|| StoreError::Conflict(format!("invoice {} vanished", record.invoice.id)))?;

        if checkout.invoice.status != InvoiceStatus::Active {
            return Err(StoreError::Conflict(format!(
                "invoice {} is not active",
                checkout.invoice.number
            )));
        }
        if checkout.sale.status != SaleStatus::Completed {
            return Err(StoreError::Conflict(format!(
                "sale {} is not completed",
                checkout.sale.id
            )));
        }
        if !checkout.order.status.can_void() {
            return Err(StoreError::Conflict(format!(
                "order {} is not voidable",
                checkout.order.id
            )));
        }

        checkout.invoice.status = InvoiceStatus::Voided;
        checkout.invoice.voided_at = Some(stamp.at);
        checkout.invoice.void_reason = stamp.reason.clone();
        checkout.invoice.voided_by = stamp.voided_by.clone();
        checkout.sale.status = SaleStatus::Voided;
        checkout.sale.voided_at = Some(stamp.at);
        checkout.order.status = OrderStatus::Voided;
        checkout.order.voided_at = Some(stamp.at);
        Ok(())
    }
}
