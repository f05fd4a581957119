pub mod checkout;
pub mod invoices;
pub mod ops;
