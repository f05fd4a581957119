//! Row types persisted by a checkout.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{CustomerId, InvoiceId, OrderId, SaleId, SkuId};
use domain::{
    DeliveryDetails, InvoiceNumber, InvoiceStatus, LineItem, Money, OrderStatus, PaymentMethod,
    SaleStatus,
};
use serde::{Deserialize, Serialize};

/// A sellable stock-keeping unit as the catalog exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub id: SkuId,
    pub name: String,
    /// Units on hand; never negative.
    pub available: i64,
    pub unit_price: Money,
    /// Soft-deactivated SKUs stay referenced by history but cannot be sold.
    pub active: bool,
}

impl SkuRecord {
    /// Creates an active SKU.
    pub fn new(
        id: impl Into<SkuId>,
        name: impl Into<String>,
        available: i64,
        unit_price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            available,
            unit_price,
            active: true,
        }
    }

    /// Returns the same SKU marked inactive.
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Outcome of a guarded stock update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    /// The update was applied; `available` is the quantity left afterwards.
    Applied { available: i64 },
    /// Not enough units; nothing was changed.
    Insufficient { available: i64 },
    /// No SKU with that code exists.
    UnknownSku,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub customer_id: Option<CustomerId>,
    pub payment_method: PaymentMethod,
    pub total: Money,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub number: InvoiceNumber,
    pub sale_id: SaleId,
    pub customer_id: Option<CustomerId>,
    pub payment_method: PaymentMethod,
    pub total: Money,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    pub voided_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub sale_id: SaleId,
    pub invoice_id: InvoiceId,
    pub customer_id: Option<CustomerId>,
    pub total: Money,
    pub status: OrderStatus,
    /// The caller's idempotency key; unique across orders.
    pub dedup_key: String,
    pub delivery: Option<DeliveryDetails>,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
}

/// Everything one checkout commits: the three root records and their lines.
///
/// The line items are stored twice, once under the sale and mirrored under
/// the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRecord {
    pub sale: SaleRecord,
    pub invoice: InvoiceRecord,
    pub order: OrderRecord,
    pub lines: Vec<LineItem>,
}

impl CheckoutRecord {
    /// Sum of the line subtotals.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(LineItem::subtotal).sum()
    }

    /// Returns sold units per SKU, in ascending SKU order.
    pub fn quantities_by_sku(&self) -> BTreeMap<SkuId, u32> {
        let mut quantities: BTreeMap<SkuId, u32> = BTreeMap::new();
        for line in &self.lines {
            let quantity = quantities.entry(line.sku_id.clone()).or_insert(0);
            *quantity = quantity.saturating_add(line.quantity);
        }
        quantities
    }

    /// Returns true if all three totals equal the line total.
    pub fn totals_agree(&self) -> bool {
        let total = self.lines_total();
        self.sale.total == total && self.invoice.total == total && self.order.total == total
    }
}

/// Audit data written when a checkout is voided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoidStamp {
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
    pub voided_by: Option<String>,
}

/// Row counts per table, used to assert that failed checkouts leave nothing behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub sales: i64,
    pub sale_lines: i64,
    pub invoices: i64,
    pub invoice_lines: i64,
    pub orders: i64,
}
