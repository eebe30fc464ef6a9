//! DGT Ledger Service - HTTP API for the Degentalk token economy.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dgt_engine::Ledger;
use dgt_service::{create_router, sweep, AppState, ServiceConfig};
use dgt_store::{RocksStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dgt=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DGT Ledger Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        jwt_configured = %config.jwt_secret.is_some(),
        sweep_interval_seconds = config.sweep_interval_seconds,
        "Service configuration loaded"
    );

    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    let store: Arc<dyn Store> = Arc::new(RocksStore::open(&config.data_dir)?);
    let ledger = Arc::new(Ledger::new(store));

    if config.sweep_interval_seconds > 0 {
        tokio::spawn(sweep::run_sweeper(
            Arc::clone(&ledger),
            config.sweep_interval_seconds,
        ));
        tracing::info!("Vault expiry sweeper started");
    }

    let state = AppState::new(ledger, config.clone());
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
