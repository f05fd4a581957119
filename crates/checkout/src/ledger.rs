//! Inventory ledger: the only writer of SKU available quantities.

use common::SkuId;
use store::{StockChange, StoreTx};

use crate::error::{CheckoutError, Result};

/// Reserves and restores stock inside a caller-owned transaction.
///
/// The ledger never opens or commits a transaction itself, so a failed
/// reservation is undone together with everything else the caller wrote.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    /// Takes `quantity` units of `sku_id` if that many are available.
    ///
    /// Returns the quantity left on success. Nothing is changed on failure.
    #[tracing::instrument(skip(self, tx))]
    pub async fn reserve<T: StoreTx>(
        &self,
        tx: &mut T,
        sku_id: &SkuId,
        quantity: u32,
    ) -> Result<i64> {
        match tx.decrement_stock(sku_id, quantity).await? {
            StockChange::Applied { available } => {
                metrics::counter!("inventory_reservations_total").increment(1);
                Ok(available)
            }
            StockChange::Insufficient { available } => {
                metrics::counter!("inventory_stockouts_total").increment(1);
                tracing::debug!(available, "insufficient stock");
                Err(CheckoutError::InsufficientStock {
                    sku_id: sku_id.clone(),
                    requested: quantity,
                    available,
                    shortfall: i64::from(quantity) - available,
                })
            }
            StockChange::UnknownSku => Err(CheckoutError::SkuNotFound(sku_id.clone())),
        }
    }

    /// Gives `quantity` units of `sku_id` back.
    ///
    /// Callers must guarantee this runs at most once per sold SKU of a checkout.
    #[tracing::instrument(skip(self, tx))]
    pub async fn restore<T: StoreTx>(
        &self,
        tx: &mut T,
        sku_id: &SkuId,
        quantity: u32,
    ) -> Result<i64> {
        match tx.increment_stock(sku_id, quantity).await? {
            StockChange::Applied { available } => Ok(available),
            StockChange::Insufficient { .. } | StockChange::UnknownSku => {
                Err(CheckoutError::Inconsistent(format!(
                    "sold SKU {sku_id} is missing from the catalog"
                )))
            }
        }
    }
}
