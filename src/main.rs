use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alloy_provider::{Provider, ProviderBuilder};
use anyhow::{Result, anyhow};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

use usdt_transfer_indexer::api::{self, AppState};
use usdt_transfer_indexer::indexer::{RpcLogFetcher, TransferFilter};
use usdt_transfer_indexer::metrics::Metrics;
use usdt_transfer_indexer::storage::postgres::PostgresLogStore;
use usdt_transfer_indexer::utils::{load_config, redact_rpc_url, rpc_url};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    if let Err(e) = dotenv {
        info!("No .env file loaded: {}", e);
    }

    info!("=========================== INITIALIZING ===========================");

    // Load config
    let config = match load_config("config.yml") {
        Ok(config) => {
            info!("Config loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(anyhow!(e));
        }
    };

    let filter = TransferFilter::from_config(&config.contract)?;
    info!("Contract: {} (topic0 {})", filter.address, filter.topic0);

    // Initialize optional metrics
    let metrics = if config.metrics.enabled {
        let metrics = Arc::new(Metrics::new(filter.address.to_checksum(None))?);
        metrics
            .start_metrics_server(&config.metrics.address, config.metrics.port)
            .await?;
        Some(metrics)
    } else {
        info!("Metrics are disabled");
        None
    };

    // Create RPC provider
    let url = rpc_url(&config.rpc)?;
    info!("RPC URL: {}", redact_rpc_url(&config.rpc));
    let provider = ProviderBuilder::new().connect_http(url).erased();

    let fetcher = RpcLogFetcher::new(
        provider,
        filter,
        Duration::from_secs(config.rpc.request_timeout_secs),
        metrics.clone(),
    );

    // Connect to storage and make sure the log table exists
    let store = match PostgresLogStore::connect(&config.database, metrics.clone()).await {
        Ok(store) => store,
        Err(e) => {
            error!("Error connecting to database: {}", e);
            return Err(anyhow!(e));
        }
    };
    store.create_table().await?;

    let state = AppState::new(Arc::new(fetcher), Arc::new(store), metrics);
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.address, config.server.port).parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("========================== STARTING SERVER ==========================");
    info!("Server started on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C signal, initiating shutdown..."),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
