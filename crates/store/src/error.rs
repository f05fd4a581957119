use domain::DomainError;
use thiserror::Error;

/// Postgres constraint guarding one order per idempotency key.
pub(crate) const DEDUP_KEY_CONSTRAINT: &str = "fulfillment_orders_dedup_key_key";

/// Postgres constraint guarding store-wide invoice number uniqueness.
pub(crate) const INVOICE_NUMBER_CONSTRAINT: &str = "invoices_number_key";

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row lock could not be acquired within the transaction's lock timeout.
    #[error("Timed out waiting for a row lock")]
    LockTimeout,

    /// The transaction lost a deadlock or serialization race, or no
    /// connection was available. Retrying the whole operation is safe.
    #[error("Store busy: {0}")]
    Busy(String),

    /// A fulfillment order with this idempotency key already exists.
    #[error("Duplicate idempotency key: {0}")]
    DuplicateDedupKey(String),

    /// An invoice with this number already exists.
    #[error("Duplicate invoice number: {0}")]
    DuplicateInvoiceNumber(String),

    /// A guarded update matched no row; the records changed underneath us.
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// A row holds a value the domain does not accept.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A simulated failure injected by the in-memory store.
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl StoreError {
    /// Returns true if the failed operation may succeed when retried from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::LockTimeout | StoreError::Busy(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => StoreError::Busy("connection pool exhausted".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                let constraint = db_err.constraint().map(str::to_string);
                let message = db_err.message().to_string();

                match (code.as_deref(), constraint.as_deref()) {
                    // lock_not_available
                    (Some("55P03"), _) => StoreError::LockTimeout,
                    // deadlock_detected, serialization_failure
                    (Some("40P01"), _) | (Some("40001"), _) => StoreError::Busy(message),
                    (Some("23505"), Some(DEDUP_KEY_CONSTRAINT)) => {
                        StoreError::DuplicateDedupKey(message)
                    }
                    (Some("23505"), Some(INVOICE_NUMBER_CONSTRAINT)) => {
                        StoreError::DuplicateInvoiceNumber(message)
                    }
                    _ => StoreError::Database(sqlx::Error::Database(db_err)),
                }
            }
            other => StoreError::Database(other),
        }
    }
}

impl From<DomainError> for StoreError {
    fn from(e: DomainError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_failures_are_retryable() {
        assert!(StoreError::LockTimeout.is_retryable());
        assert!(StoreError::Busy("deadlock".into()).is_retryable());
        assert!(!StoreError::DuplicateDedupKey("k".into()).is_retryable());
        assert!(!StoreError::Injected("boom".into()).is_retryable());
    }

    #[test]
    fn pool_timeout_maps_to_busy() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Busy(_)));
    }

    #[test]
    fn domain_errors_become_invalid_data() {
        let err: StoreError = DomainError::InvalidInvoiceNumber("X1".into()).into();
        assert!(matches!(err, StoreError::InvalidData(msg) if msg.contains("X1")));
    }
}
