//! HTTP API server with observability for the checkout core.
//!
//! Provides REST endpoints for checkout, void and invoice lookup,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::CheckoutService;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::checkout::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<S>))
        .route("/checkout", post(routes::checkout::create::<S>))
        .route("/void/{invoice_id}", post(routes::invoices::void::<S>))
        .route("/invoices/{invoice_id}", get(routes::invoices::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state around a store.
pub fn create_default_state<S: Store + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        checkout: CheckoutService::new(store),
    })
}
