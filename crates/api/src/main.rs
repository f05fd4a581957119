//! API server entry point.

use std::error::Error;

use api::config::{Config, LogFormat};
use common::CustomerId;
use domain::Money;
use sqlx::postgres::PgPoolOptions;
use store::{InMemoryStore, PostgresStore, SkuRecord};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Seeds a walk-in customer and a small catalog so the in-memory server can
/// take checkouts right away.
async fn seed_demo_catalog(store: &InMemoryStore) {
    let customer = CustomerId::new();
    store.insert_customer(customer, "Walk-in").await;
    for (sku, name, available, cents) in [
        ("SKU-001", "T-shirt", 50, 1500),
        ("SKU-002", "Socks", 200, 300),
        ("SKU-003", "Cap", 20, 1200),
    ] {
        store
            .upsert_sku(&SkuRecord::new(sku, name, available, Money::from_cents(cents)))
            .await;
    }
    tracing::info!(customer_id = %customer, skus = 3, "seeded in-memory store");
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(app: axum::Router, addr: &str) -> Result<(), Box<dyn Error>> {
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Create the store and application state
    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await?;
            let store = PostgresStore::new(pool).with_lock_timeout(config.lock_timeout);
            if config.run_migrations {
                store.run_migrations().await?;
                tracing::info!("database migrations applied");
            }
            tracing::info!(max_connections = config.max_connections, "using PostgreSQL store");
            api::create_app(api::create_default_state(store), metrics_handle)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            let store = InMemoryStore::new().with_lock_timeout(config.lock_timeout);
            seed_demo_catalog(&store).await;
            api::create_app(api::create_default_state(store), metrics_handle)
        }
    };

    // 4. Start server
    serve(app, &config.addr()).await
}
