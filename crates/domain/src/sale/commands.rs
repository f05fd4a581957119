//! Checkout and void commands.

use std::collections::BTreeMap;

use common::{CustomerId, InvoiceId, SkuId};

use crate::error::DomainError;

use super::{DeliveryDetails, Money, PaymentMethod};

/// Longest idempotency key accepted (matches the `dedup_key` column width).
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Largest quantity of one SKU a cart may request (the stock columns are `INTEGER`).
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// One requested line of a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    /// The SKU to sell.
    pub sku_id: SkuId,

    /// Units requested.
    pub quantity: u32,

    /// Price per unit at time of sale. `None` means the catalog price.
    pub unit_price: Option<Money>,
}

impl CheckoutLine {
    /// Creates a line sold at the catalog price.
    pub fn new(sku_id: impl Into<SkuId>, quantity: u32) -> Self {
        Self {
            sku_id: sku_id.into(),
            quantity,
            unit_price: None,
        }
    }

    /// Creates a line with an explicit unit price.
    pub fn priced(sku_id: impl Into<SkuId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            sku_id: sku_id.into(),
            quantity,
            unit_price: Some(unit_price),
        }
    }
}

/// Command converting a cart into a sale, an invoice and a fulfillment order.
#[derive(Debug, Clone)]
pub struct Checkout {
    /// The buying customer.
    pub customer_id: CustomerId,

    /// How the sale is paid.
    pub payment_method: PaymentMethod,

    /// Requested lines, in cart order.
    pub lines: Vec<CheckoutLine>,

    /// Caller-supplied token making retries safe.
    pub idempotency_key: String,

    /// Total the caller computed, checked against the committed total.
    pub declared_total: Option<Money>,

    /// Delivery information for the fulfillment order.
    pub delivery: Option<DeliveryDetails>,
}

impl Checkout {
    /// Creates a new Checkout command.
    pub fn new(
        customer_id: CustomerId,
        payment_method: PaymentMethod,
        lines: Vec<CheckoutLine>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            customer_id,
            payment_method,
            lines,
            idempotency_key: idempotency_key.into(),
            declared_total: None,
            delivery: None,
        }
    }

    /// Sets the total the caller expects.
    pub fn with_declared_total(mut self, total: Money) -> Self {
        self.declared_total = Some(total);
        self
    }

    /// Attaches delivery details.
    pub fn with_delivery(mut self, delivery: DeliveryDetails) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Checks the shape of the request without touching storage.
    pub fn validate(&self) -> Result<(), DomainError> {
        let key_len = self.idempotency_key.trim().len();
        if key_len == 0 {
            return Err(DomainError::MissingIdempotencyKey);
        }
        if self.idempotency_key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(DomainError::IdempotencyKeyTooLong {
                len: self.idempotency_key.len(),
                max: MAX_IDEMPOTENCY_KEY_LEN,
            });
        }

        if self.lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        for line in &self.lines {
            if line.sku_id.as_str().trim().is_empty() {
                return Err(DomainError::MissingSku);
            }
            if line.quantity == 0 {
                return Err(DomainError::InvalidQuantity {
                    sku_id: line.sku_id.clone(),
                    quantity: 0,
                });
            }
            if let Some(price) = line.unit_price
                && price.is_negative()
            {
                return Err(DomainError::InvalidPrice {
                    sku_id: line.sku_id.clone(),
                    price: price.cents(),
                });
            }
        }

        let mut merged: BTreeMap<&SkuId, u64> = BTreeMap::new();
        for line in &self.lines {
            let quantity = merged.entry(&line.sku_id).or_insert(0);
            *quantity += u64::from(line.quantity);
            if *quantity > u64::from(MAX_LINE_QUANTITY) {
                return Err(DomainError::QuantityTooLarge {
                    sku_id: line.sku_id.clone(),
                    quantity: *quantity,
                    max: MAX_LINE_QUANTITY,
                });
            }
        }

        Ok(())
    }

    /// Returns total requested units per SKU, in ascending SKU order.
    ///
    /// Reservations walk this map so concurrent carts lock shared SKU rows in
    /// the same order. It also serves as the cart fingerprint when comparing a
    /// retried request against the committed one. Totals are only exact for a
    /// cart that passed [`Checkout::validate`].
    pub fn quantities_by_sku(&self) -> BTreeMap<SkuId, u32> {
        let mut quantities: BTreeMap<SkuId, u32> = BTreeMap::new();
        for line in &self.lines {
            let quantity = quantities.entry(line.sku_id.clone()).or_insert(0);
            *quantity = quantity.saturating_add(line.quantity);
        }
        quantities
    }
}

/// Command reversing a committed checkout through its invoice.
#[derive(Debug, Clone)]
pub struct VoidInvoice {
    /// The invoice to void.
    pub invoice_id: InvoiceId,

    /// Why the checkout is being reversed.
    pub reason: Option<String>,

    /// Who requested the void.
    pub voided_by: Option<String>,
}

impl VoidInvoice {
    /// Creates a new VoidInvoice command.
    pub fn new(invoice_id: InvoiceId) -> Self {
        Self {
            invoice_id,
            reason: None,
            voided_by: None,
        }
    }

    /// Records why the invoice is voided.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Records who voided the invoice.
    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.voided_by = Some(actor.into());
        self
    }
}
