//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use serde_json::{Value, json};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout or void error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": msg, "code": "not_found" }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "code": "bad_request" }),
            ),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": msg, "code": "internal" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, Value) {
    let mut body = json!({ "error": err.to_string(), "code": err.reason() });

    let status = match &err {
        CheckoutError::Validation(_) | CheckoutError::SkuInactive(_) => StatusCode::BAD_REQUEST,
        CheckoutError::CustomerNotFound(_)
        | CheckoutError::SkuNotFound(_)
        | CheckoutError::InvoiceNotFound(_) => StatusCode::NOT_FOUND,
        CheckoutError::InsufficientStock {
            sku_id,
            requested,
            available,
            shortfall,
        } => {
            body["sku_id"] = json!(sku_id);
            body["requested"] = json!(requested);
            body["available"] = json!(available);
            body["shortfall"] = json!(shortfall);
            StatusCode::CONFLICT
        }
        CheckoutError::IdempotencyKeyReused(_) | CheckoutError::AlreadyVoided(_) => {
            StatusCode::CONFLICT
        }
        CheckoutError::NotVoidable { status, .. } => {
            body["order_status"] = json!(status);
            StatusCode::CONFLICT
        }
        CheckoutError::TotalMismatch { declared, computed } => {
            body["declared_cents"] = json!(declared.cents());
            body["computed_cents"] = json!(computed.cents());
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CheckoutError::Store(e) if e.is_retryable() => {
            body["retryable"] = json!(true);
            StatusCode::SERVICE_UNAVAILABLE
        }
        CheckoutError::SequenceExhausted(_)
        | CheckoutError::Inconsistent(_)
        | CheckoutError::Store(_) => {
            tracing::error!(error = %err, "checkout failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, body)
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
