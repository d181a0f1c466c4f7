//! SEPA broker server.
//!
//! Loads configuration, wires the engine, registry and real-time engine,
//! and serves HTTP and the subscribe channel until interrupted.

use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

use broker_core::config::BrokerConfig;
use broker_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("BROKER_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match BrokerConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &BrokerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let logging = &config.logging;
    if logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(logging.targets)
            .with_thread_ids(logging.thread_ids)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(logging.targets)
            .init();
    }
}

/// Main server run function
async fn run(config: BrokerConfig) -> Result<(), AppError> {
    tracing::info!("Starting SEPA broker v{}", env!("CARGO_PKG_VERSION"));

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = broker_api::build_state(config)?;
    let realtime = state.realtime.clone();

    let server = broker_api::start(state).await?;
    tracing::info!(addr = %server.local_addr(), "Broker listening");

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    realtime.shutdown();
    server.shutdown(grace).await?;

    tracing::info!("Broker shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}
