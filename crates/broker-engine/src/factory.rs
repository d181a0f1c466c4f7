//! Engine selection from configuration.

use std::sync::Arc;

use tracing::info;

use broker_core::config::engine::EngineConfig;
use broker_core::error::AppError;
use broker_core::result::AppResult;
use broker_core::traits::QueryEngine;

use crate::providers::{MemoryEngine, RemoteEngine};

/// Builds the engine named by `engine.provider`.
pub fn build_engine(config: &EngineConfig) -> AppResult<Arc<dyn QueryEngine>> {
    let engine: Arc<dyn QueryEngine> = match config.provider.as_str() {
        "memory" => Arc::new(MemoryEngine::new()),
        "remote" => Arc::new(RemoteEngine::new(config)?),
        other => {
            return Err(AppError::configuration(format!(
                "Unknown engine provider '{other}'"
            )));
        }
    };

    info!(engine = engine.engine_type(), "Query engine ready");
    Ok(engine)
}
