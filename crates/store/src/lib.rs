pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTx};
pub use postgres::{PostgresStore, PostgresTx};
pub use records::{
    CheckoutRecord, InvoiceRecord, OrderRecord, RecordCounts, SaleRecord, SkuRecord, StockChange,
    VoidStamp,
};
pub use store::{DEFAULT_LOCK_TIMEOUT, Store, StoreTx};
