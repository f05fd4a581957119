//! Checkout error types.

use common::{CustomerId, InvoiceId, SkuId};
use domain::{DomainError, InvoiceNumber, Money, OrderStatus, Period};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during checkout or void.
///
/// Every variant is reported after the transaction has been rolled back.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request is malformed.
    #[error("Validation error: {0}")]
    Validation(DomainError),

    /// The customer directory does not know the customer.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// The catalog does not know a referenced SKU.
    #[error("SKU not found: {0}")]
    SkuNotFound(SkuId),

    /// A referenced SKU has been deactivated.
    #[error("SKU is no longer sold: {0}")]
    SkuInactive(SkuId),

    /// A SKU does not have enough units on hand.
    #[error("Insufficient stock for {sku_id}: requested {requested}, available {available}")]
    InsufficientStock {
        sku_id: SkuId,
        requested: u32,
        available: i64,
        shortfall: i64,
    },

    /// The caller's declared total disagrees with the line items.
    #[error("Declared total {declared} does not match computed total {computed}")]
    TotalMismatch { declared: Money, computed: Money },

    /// No invoice number is left in the period.
    #[error("Invoice sequence exhausted for period {0}")]
    SequenceExhausted(Period),

    /// The idempotency key belongs to a checkout with a different cart.
    #[error("Idempotency key already used for a different checkout: {0}")]
    IdempotencyKeyReused(String),

    /// No invoice with this id exists.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// The invoice has already been voided.
    #[error("Invoice {0} is already voided")]
    AlreadyVoided(InvoiceNumber),

    /// The fulfillment order has progressed past the point where it can be voided.
    #[error("Invoice {invoice} cannot be voided: order is {status}")]
    NotVoidable {
        invoice: InvoiceNumber,
        status: OrderStatus,
    },

    /// Stored records contradict each other.
    #[error("Inconsistent records: {0}")]
    Inconsistent(String),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<DomainError> for CheckoutError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::SequenceExhausted { period } => CheckoutError::SequenceExhausted(period),
            other => CheckoutError::Validation(other),
        }
    }
}

impl CheckoutError {
    /// Returns true if the whole operation can be retried from scratch.
    ///
    /// Retrying a checkout with the same idempotency key never duplicates it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Store(e) if e.is_retryable())
    }

    /// Short label used for the `reason` metric label and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "validation",
            CheckoutError::CustomerNotFound(_) => "customer_not_found",
            CheckoutError::SkuNotFound(_) => "sku_not_found",
            CheckoutError::SkuInactive(_) => "sku_inactive",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::TotalMismatch { .. } => "total_mismatch",
            CheckoutError::SequenceExhausted(_) => "sequence_exhausted",
            CheckoutError::IdempotencyKeyReused(_) => "idempotency_key_reused",
            CheckoutError::InvoiceNotFound(_) => "invoice_not_found",
            CheckoutError::AlreadyVoided(_) => "already_voided",
            CheckoutError::NotVoidable { .. } => "not_voidable",
            CheckoutError::Inconsistent(_) => "inconsistent",
            CheckoutError::Store(e) if e.is_retryable() => "busy",
            CheckoutError::Store(_) => "store",
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
