use std::time::Duration;

use async_trait::async_trait;
use common::{CustomerId, InvoiceId, SkuId};
use domain::Period;

use crate::{CheckoutRecord, Result, SkuRecord, StockChange, VoidStamp};

/// Lock wait applied to every transaction unless configured otherwise.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// A transactional store.
///
/// All implementations must be thread-safe (Send + Sync). Every write goes
/// through a [`StoreTx`] obtained from [`Store::begin`], so the atomicity
/// boundary is always visible at the call site.
#[async_trait]
pub trait Store: Send + Sync {
    /// The unit-of-work handle this store hands out.
    type Tx: StoreTx;

    /// Opens a transaction.
    ///
    /// Lock waits inside the transaction are bounded by the store's lock
    /// timeout; exceeding it fails with `StoreError::LockTimeout`.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// One open transaction.
///
/// Dropping a transaction without calling [`StoreTx::commit`] rolls it back.
/// Every method is a fixed, typed statement; there is no generic update path.
#[async_trait]
pub trait StoreTx: Send + Sized {
    /// Makes every change of this transaction durable.
    async fn commit(self) -> Result<()>;

    /// Discards every change of this transaction.
    async fn rollback(self) -> Result<()>;

    /// Returns true if the customer directory knows this customer.
    async fn customer_exists(&mut self, id: CustomerId) -> Result<bool>;

    /// Looks up a SKU in the catalog.
    async fn find_sku(&mut self, id: &SkuId) -> Result<Option<SkuRecord>>;

    /// Decrements available stock only if at least `quantity` units are on hand.
    ///
    /// Concurrent calls on the same SKU serialize on the row; the condition is
    /// evaluated against the latest committed quantity, so two callers can
    /// never both take the last unit.
    async fn decrement_stock(&mut self, id: &SkuId, quantity: u32) -> Result<StockChange>;

    /// Increments available stock unconditionally.
    async fn increment_stock(&mut self, id: &SkuId, quantity: u32) -> Result<StockChange>;

    /// Advances the invoice counter of `period` and returns the new value.
    ///
    /// The first call for a period seeds the counter from the highest invoice
    /// number already issued with the period's prefix. The counter row stays
    /// locked until this transaction ends, serializing checkouts in the same
    /// period; a rollback undoes the increment.
    async fn advance_invoice_counter(&mut self, period: Period) -> Result<u32>;

    /// Blocks until no other transaction holds `dedup_key`, then holds it
    /// until this transaction ends.
    ///
    /// Taken before [`StoreTx::find_checkout_by_dedup_key`], this makes the
    /// lookup see any checkout a concurrent holder of the key committed.
    async fn lock_dedup_key(&mut self, dedup_key: &str) -> Result<()>;

    /// Loads the checkout whose fulfillment order carries `dedup_key`.
    async fn find_checkout_by_dedup_key(&mut self, dedup_key: &str)
    -> Result<Option<CheckoutRecord>>;

    /// Loads a checkout through its invoice without locking.
    async fn find_checkout_by_invoice(&mut self, id: InvoiceId) -> Result<Option<CheckoutRecord>>;

    /// Loads a checkout through its invoice and locks its sale, invoice and
    /// order rows until the transaction ends.
    async fn lock_checkout_by_invoice(&mut self, id: InvoiceId) -> Result<Option<CheckoutRecord>>;

    /// Inserts the sale, invoice, fulfillment order and both copies of the lines.
    async fn insert_checkout(&mut self, record: &CheckoutRecord) -> Result<()>;

    /// Flips the sale, invoice and fulfillment order of `record` to voided.
    ///
    /// Each update is guarded by the expected current status; if any of them
    /// matches no row the call fails with `StoreError::Conflict`.
    async fn mark_checkout_voided(&mut self, record: &CheckoutRecord, stamp: &VoidStamp)
    -> Result<()>;
}
