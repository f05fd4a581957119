//! Invoice read and void endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use common::InvoiceId;
use domain::{DeliveryDetails, VoidInvoice};
use serde::{Deserialize, Serialize};
use store::{CheckoutRecord, Store};

use crate::error::ApiError;
use crate::routes::checkout::AppState;

/// Header carrying the authenticated actor, set by the auth layer in front of us.
pub const ACTOR_HEADER: &str = "x-actor-id";

#[derive(Deserialize, Default)]
pub struct VoidRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoidResponse {
    pub invoice_id: String,
    pub invoice_number: String,
    pub invoice_status: String,
    pub sale_status: String,
    pub order_status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceLineResponse {
    pub sku_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub invoice_id: String,
    pub invoice_number: String,
    pub status: String,
    pub customer_id: Option<String>,
    pub payment_method: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    pub voided_by: Option<String>,
    pub sale_id: String,
    pub sale_status: String,
    pub order_id: String,
    pub order_status: String,
    pub delivery: Option<DeliveryDetails>,
    pub lines: Vec<InvoiceLineResponse>,
}

impl From<CheckoutRecord> for InvoiceResponse {
    fn from(record: CheckoutRecord) -> Self {
        let lines = record
            .lines
            .iter()
            .map(|line| InvoiceLineResponse {
                sku_id: line.sku_id.to_string(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal().cents(),
            })
            .collect();

        Self {
            invoice_id: record.invoice.id.to_string(),
            invoice_number: record.invoice.number.to_string(),
            status: record.invoice.status.to_string(),
            customer_id: record.invoice.customer_id.map(|c| c.to_string()),
            payment_method: record.invoice.payment_method.to_string(),
            total_cents: record.invoice.total.cents(),
            created_at: record.invoice.created_at,
            voided_at: record.invoice.voided_at,
            void_reason: record.invoice.void_reason,
            voided_by: record.invoice.voided_by,
            sale_id: record.sale.id.to_string(),
            sale_status: record.sale.status.to_string(),
            order_id: record.order.id.to_string(),
            order_status: record.order.status.to_string(),
            delivery: record.order.delivery,
            lines,
        }
    }
}

fn parse_invoice_id(id: &str) -> Result<InvoiceId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid invoice ID: {e}")))
}

/// POST /void/{invoice_id}: reverse a committed checkout.
#[tracing::instrument(skip(state, headers, body))]
pub async fn void<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<VoidResponse>, ApiError> {
    let invoice_id = parse_invoice_id(&id)?;
    let req: VoidRequest = if body.iter().all(u8::is_ascii_whitespace) {
        VoidRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?
    };

    let mut cmd = VoidInvoice::new(invoice_id);
    if let Some(reason) = req.reason {
        cmd = cmd.with_reason(reason);
    }
    if let Some(actor) = headers.get(ACTOR_HEADER).and_then(|v| v.to_str().ok()) {
        cmd = cmd.by(actor);
    }

    let record = state.checkout.void(cmd).await?;

    Ok(Json(VoidResponse {
        invoice_id: record.invoice.id.to_string(),
        invoice_number: record.invoice.number.to_string(),
        invoice_status: record.invoice.status.to_string(),
        sale_status: record.sale.status.to_string(),
        order_status: record.order.status.to_string(),
    }))
}

/// GET /invoices/{invoice_id}: load an invoice with its lines and linked records.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice_id = parse_invoice_id(&id)?;
    let record = state
        .checkout
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Invoice {id} not found")))?;

    Ok(Json(InvoiceResponse::from(record)))
}
