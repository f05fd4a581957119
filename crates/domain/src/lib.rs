//! Domain layer for the checkout core.
//!
//! This crate holds the pure, storage-agnostic parts of checkout:
//! - Money and line item value objects
//! - Status state machines for sales, invoices and fulfillment orders
//! - Invoice numbering (`F<YYYY><MM><NNNN>`) scoped to a billing period
//! - Checkout and void commands with their input validation

pub mod error;
pub mod sale;

pub use error::DomainError;
pub use sale::{
    Checkout, CheckoutLine, DeliveryDetails, InvoiceNumber, InvoiceStatus, LineItem,
    MAX_COUNTER, MAX_IDEMPOTENCY_KEY_LEN, MAX_LINE_QUANTITY, Money, OrderStatus, PaymentMethod, Period, SaleStatus,
    VoidInvoice,
};
