//! Sale, invoice and fulfillment order value types.

mod commands;
mod invoice_number;
mod state;
mod value_objects;

pub use commands::{Checkout, CheckoutLine, MAX_IDEMPOTENCY_KEY_LEN, MAX_LINE_QUANTITY, VoidInvoice};
pub use invoice_number::{InvoiceNumber, MAX_COUNTER, Period};
pub use state::{InvoiceStatus, OrderStatus, SaleStatus};
pub use value_objects::{DeliveryDetails, LineItem, Money, PaymentMethod};
