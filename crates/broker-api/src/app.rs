//! Application builder: wires services, router and middleware, and runs the
//! listener.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use broker_auth::{AuthorizationService, InMemoryAuthorization};
use broker_core::config::BrokerConfig;
use broker_core::error::{AppError, ErrorKind};
use broker_core::result::AppResult;
use broker_realtime::RealtimeEngine;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Creates the engine adapter, the identity registry and the real-time
/// engine from configuration.
pub fn build_state(config: BrokerConfig) -> AppResult<AppState> {
    info!(provider = %config.engine.provider, "Initializing query engine");
    let engine = broker_engine::build_engine(&config.engine)?;

    let registry = Arc::new(InMemoryAuthorization::new(&config.auth)?);
    let auth = Arc::new(AuthorizationService::new(&config.auth, registry)?);
    info!(enabled = config.auth.enabled, "Authorization initialized");

    let realtime = Arc::new(RealtimeEngine::new(&config, engine, auth));

    Ok(AppState {
        config: Arc::new(config),
        realtime,
    })
}

/// A running listener.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<AppResult<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the HTTP endpoints.
    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of the real-time channel on `path`.
    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Stops accepting connections and waits up to `grace` for in-flight
    /// requests.
    pub async fn shutdown(mut self, grace: Duration) -> AppResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match tokio::time::timeout(grace, &mut self.task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(AppError::internal(format!("Server task failed: {e}"))),
            Err(_) => {
                self.task.abort();
                info!("Graceful shutdown timed out, listener aborted");
                Ok(())
            }
        }
    }
}

/// Binds the configured address and serves the application.
///
/// Returns once the listener is ready; a bind failure or a missed readiness
/// deadline is reported as an error.
pub async fn start(state: AppState) -> AppResult<ServerHandle> {
    let server = &state.config.server;
    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Transport, format!("Failed to bind {addr}"), e)
    })?;
    let local = listener.local_addr()?;

    let ready_timeout = Duration::from_secs(server.ready_timeout_seconds);
    let channel_path = state.config.gate.path.clone();
    let app = build_app(state);

    let (ready_tx, ready_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        info!(
            "SPARQL 1.1 Subscribe | ws://{}:{}{}",
            local.ip(),
            local.port(),
            channel_path
        );
        let _ = ready_tx.send(());

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))
    });

    match tokio::time::timeout(ready_timeout, ready_rx).await {
        Ok(Ok(())) => Ok(ServerHandle {
            addr: local,
            shutdown_tx: Some(shutdown_tx),
            task,
        }),
        _ => {
            task.abort();
            Err(AppError::transport(format!(
                "Listener on {local} not ready within {}s",
                ready_timeout.as_secs()
            )))
        }
    }
}
