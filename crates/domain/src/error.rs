//! Domain error types.

use common::SkuId;
use thiserror::Error;

use crate::sale::Period;

/// Errors raised while validating checkout input or domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The cart has no line items.
    #[error("Cart has no items")]
    EmptyCart,

    /// The idempotency key is empty.
    #[error("Idempotency key is required")]
    MissingIdempotencyKey,

    /// The idempotency key exceeds the storable length.
    #[error("Idempotency key is {len} characters long (maximum {max})")]
    IdempotencyKeyTooLong { len: usize, max: usize },

    /// A line item quantity is not positive.
    #[error("Invalid quantity for {sku_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { sku_id: SkuId, quantity: i64 },

    /// A SKU's requested quantity exceeds what a stock row can hold.
    #[error("Quantity for {sku_id} is {quantity} (maximum {max})")]
    QuantityTooLarge { sku_id: SkuId, quantity: u64, max: u32 },

    /// A line subtotal or the cart total does not fit in the money range.
    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    /// A line item unit price is negative.
    #[error("Invalid unit price for {sku_id}: {price} (must not be negative)")]
    InvalidPrice { sku_id: SkuId, price: i64 },

    /// A SKU code is blank.
    #[error("SKU code is required")]
    MissingSku,

    /// A string does not have the `F<YYYY><MM><NNNN>` shape.
    #[error("Invalid invoice number: {0}")]
    InvalidInvoiceNumber(String),

    /// A year/month pair does not describe a billing period.
    #[error("Invalid billing period: {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },

    /// The 4-digit invoice counter for a period is used up.
    #[error("Invoice sequence exhausted for period {period}")]
    SequenceExhausted { period: Period },

    /// A status string read from storage is not recognised.
    #[error("Unknown {entity} status: {value}")]
    UnknownStatus { entity: &'static str, value: String },
}
