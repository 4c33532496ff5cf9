//! acct API Server
//!
//! Loads configuration, connects the user store and serves the HTTP API
//! until Ctrl-C or SIGTERM.
//!
//! Author: hephaex@gmail.com

use acct_api::{create_router, state::AppState};
use acct_core::{AppConfig, DatabaseConfig, LoggingConfig};
use acct_store::{MemoryUserStore, SurrealUserStore, UserStore};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    // Tracing comes up before config errors are reported so they are logged
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let config = config.inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration, refusing to start");
    })?;

    let store = open_store(&config.database).await?;

    let addr = config.bind_addr();
    let service_name = config.server.service_name.clone();
    let mode = config.runtime;

    let state = Arc::new(AppState::new(config, store));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(service = %service_name, mode = %mode, "Server starting on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &logging.level;
        EnvFilter::new(format!(
            "acct_api={level},acct_store={level},audit={level},tower_http={level}"
        ))
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_store(database: &DatabaseConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    if database.is_memory() {
        tracing::warn!("Using in-memory user store; data is lost on shutdown");
        return Ok(Arc::new(MemoryUserStore::new()));
    }

    let store = SurrealUserStore::connect(database)
        .await
        .context("Failed to connect to the user database")?;
    store
        .init_schema()
        .await
        .context("Failed to initialize the user database schema")?;

    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
