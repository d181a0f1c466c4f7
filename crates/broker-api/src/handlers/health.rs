//! Health and dependability handlers.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use broker_realtime::metrics::MetricsSnapshot;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub engine: String,
    pub engine_reachable: bool,
    pub gates: usize,
    pub subscriptions: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.realtime.scheduler.engine();
    let engine_reachable = engine.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: if engine_reachable { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        engine: engine.engine_type().to_string(),
        engine_reachable,
        gates: state.realtime.gates.len(),
        subscriptions: state.realtime.scheduler.subscriptions().len(),
    })
}

/// GET /gates
pub async fn gates(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.realtime.metrics.snapshot())
}

/// POST /gates/reset
pub async fn reset_gates(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    state.realtime.metrics.reset();
    Json(state.realtime.metrics.snapshot())
}
