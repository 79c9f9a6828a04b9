// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runlet Server - HTTP action host binary.

use std::sync::Arc;

use tracing::{info, warn};

use runlet_core::markers::StdioMarker;
use runlet_core::resolver::DylibResolver;
use runlet_server::config::Config;
use runlet_server::routes;
use runlet_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runlet_server=info,runlet_core=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;
    std::fs::create_dir_all(&config.data_dir)?;

    info!(
        bind_addr = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        "Starting runlet server"
    );

    let state = AppState::new(
        Arc::new(DylibResolver::new()),
        config.data_dir.clone(),
        Arc::new(StdioMarker),
    );
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Action host ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Runlet server shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
