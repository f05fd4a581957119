//! Invoice number generation.

use domain::{InvoiceNumber, Period};
use store::StoreTx;

use crate::error::Result;

/// Issues `F<YYYY><MM><NNNN>` invoice numbers, one period counter at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceGenerator;

impl SequenceGenerator {
    /// Returns the next invoice number of `period`.
    ///
    /// The counter is advanced inside `tx`, so rolling the transaction back
    /// releases the number again. Fails with `SequenceExhausted` once the
    /// period has used all 9999 numbers; the counter is left untouched then
    /// because the caller rolls back.
    #[tracing::instrument(skip(self, tx))]
    pub async fn next<T: StoreTx>(&self, tx: &mut T, period: Period) -> Result<InvoiceNumber> {
        let counter = tx.advance_invoice_counter(period).await?;
        let number = InvoiceNumber::new(period, counter)?;
        metrics::counter!("invoice_numbers_issued_total").increment(1);
        Ok(number)
    }
}
