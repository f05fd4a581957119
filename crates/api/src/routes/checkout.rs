//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use checkout::{CheckoutOutcome, CheckoutService};
use common::CustomerId;
use domain::{
    Checkout, CheckoutLine, DeliveryDetails, DomainError, MAX_LINE_QUANTITY, Money, PaymentMethod,
};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;

/// Header carrying the idempotency key when the body does not.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub checkout: CheckoutService<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub payment_method: String,
    pub items: Vec<CheckoutItemRequest>,
    pub idempotency_key: Option<String>,
    pub total_cents: Option<i64>,
    pub delivery: Option<DeliveryDetails>,
}

#[derive(Deserialize)]
pub struct CheckoutItemRequest {
    pub sku_id: String,
    pub quantity: i64,
    pub unit_price_cents: Option<i64>,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutResponse {
    pub sale_id: String,
    pub invoice_id: String,
    pub invoice_number: String,
    pub order_id: String,
    pub total_cents: i64,
}

impl From<&CheckoutOutcome> for CheckoutResponse {
    fn from(outcome: &CheckoutOutcome) -> Self {
        let record = &outcome.record;
        Self {
            sale_id: record.sale.id.to_string(),
            invoice_id: record.invoice.id.to_string(),
            invoice_number: record.invoice.number.to_string(),
            order_id: record.order.id.to_string(),
            total_cents: record.sale.total.cents(),
        }
    }
}

impl CheckoutRequest {
    fn into_command(self, headers: &HeaderMap) -> Result<Checkout, ApiError> {
        let customer_id: CustomerId = self
            .customer_id
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("Invalid customer_id: {e}")))?;
        let payment_method: PaymentMethod = self
            .payment_method
            .parse()
            .map_err(|e: DomainError| ApiError::BadRequest(e.to_string()))?;

        let lines = self
            .items
            .into_iter()
            .map(|item| {
                if item.quantity <= 0 {
                    return Err(DomainError::InvalidQuantity {
                        sku_id: item.sku_id.as_str().into(),
                        quantity: item.quantity,
                    });
                }
                let quantity = u32::try_from(item.quantity)
                    .ok()
                    .filter(|q| *q <= MAX_LINE_QUANTITY)
                    .ok_or_else(|| DomainError::QuantityTooLarge {
                        sku_id: item.sku_id.as_str().into(),
                        quantity: item.quantity.unsigned_abs(),
                        max: MAX_LINE_QUANTITY,
                    })?;
                Ok(CheckoutLine {
                    sku_id: item.sku_id.into(),
                    quantity,
                    unit_price: item.unit_price_cents.map(Money::from_cents),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()
            .map_err(checkout::CheckoutError::from)?;

        let idempotency_key = match self.idempotency_key {
            Some(key) => key,
            None => headers
                .get(IDEMPOTENCY_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_default(),
        };

        let mut cmd = Checkout::new(customer_id, payment_method, lines, idempotency_key);
        if let Some(total) = self.total_cents {
            cmd = cmd.with_declared_total(Money::from_cents(total));
        }
        if let Some(delivery) = self.delivery {
            cmd = cmd.with_delivery(delivery);
        }
        Ok(cmd)
    }
}

// -- Handlers --

/// POST /checkout: turn a cart into a sale, an invoice and a fulfillment order.
///
/// Responds `201 Created` for a new checkout and `200 OK` when the
/// idempotency key matched an earlier one.
#[tracing::instrument(skip(state, headers, body))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let Json(req) = body?;
    let cmd = req.into_command(&headers)?;

    let outcome = state.checkout.checkout(cmd).await?;

    let status = if outcome.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(CheckoutResponse::from(&outcome))))
}
