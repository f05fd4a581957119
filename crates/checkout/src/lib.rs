//! Checkout core for the retail back office.
//!
//! This crate turns a cart into a sale, an invoice and a fulfillment order in
//! a single store transaction, and reverses such a checkout through its
//! invoice:
//! 1. Validate the cart against the customer directory and the catalog
//! 2. Reserve stock through the [`InventoryLedger`], in ascending SKU order
//! 3. Draw the next invoice number from the [`SequenceGenerator`]
//! 4. Write every record and commit
//!
//! Any failure rolls the transaction back, so no partial checkout or void is
//! ever visible. Retries carrying the same idempotency key return the
//! original checkout instead of writing a new one.

pub mod error;
pub mod ledger;
pub mod sequence;
pub mod service;

pub use error::{CheckoutError, Result};
pub use ledger::InventoryLedger;
pub use sequence::SequenceGenerator;
pub use service::{CheckoutOutcome, CheckoutService};
