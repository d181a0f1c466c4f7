//! Route definitions for the broker HTTP API.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes.
///
/// Any path not matched below is treated as a subscribe channel upgrade so
/// that a client on the wrong path is told so over its own connection.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.gate.max_message_size;
    let channel_path = state.config.gate.path.clone();

    Router::new()
        .merge(oauth_routes())
        .merge(sparql_routes())
        .merge(health_routes())
        .route(&channel_path, get(handlers::ws::ws_handler))
        .fallback(handlers::ws::ws_handler)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Registration and token endpoints
fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/oauth/register", post(handlers::oauth::register))
        .route("/oauth/token", post(handlers::oauth::token))
}

/// SPARQL 1.1 Protocol
fn sparql_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(handlers::sparql::query))
        .route("/update", post(handlers::sparql::update))
}

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/gates", get(handlers::health::gates))
        .route("/gates/reset", post(handlers::health::reset_gates))
}
