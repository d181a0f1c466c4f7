//! WebSocket upgrade handler for the subscribe channel.

use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::Uri;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{error, info, warn};

use broker_core::error::AppError;

use crate::state::AppState;

/// How long the writer may keep flushing after the reader stopped.
const WRITER_DRAIN: Duration = Duration::from_secs(1);

/// Upgrade on any path. The gate answers `wrong_path` itself when the path
/// is not the configured one; a plain HTTP request gets a 404.
pub async fn ws_handler(
    State(state): State<AppState>,
    uri: Uri,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let path = uri.path().to_string();
    let ws = ws.map_err(|_| {
        AppError::not_found(format!(
            "Bad resource descriptor: {path} Use: {}",
            state.config.gate.path
        ))
    })?;

    let max_message_size = state.config.gate.max_message_size;
    Ok(ws
        .max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_gate(state, path, socket)))
}

/// Runs one connection: a writer task draining the gate's outbound queue
/// and a reader loop feeding frames to the multiplexer.
async fn handle_gate(state: AppState, path: String, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let multiplexer = state.realtime.multiplexer.clone();

    let (gate, mut outbound) = multiplexer.open(&path);
    let gid = gate.id;

    let mut writer = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let text = match msg.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!(gid = %gid, error = %e, "Failed to encode outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let cancel = gate.cancellation();
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = ws_rx.next() => frame,
        };
        match frame {
            Some(Ok(Message::Text(text))) => multiplexer.on_frame(gid, text.as_str(), true),
            Some(Ok(Message::Binary(bytes))) => multiplexer.on_binary_frame(gid, &bytes, true),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(gid = %gid, error = %e, "WebSocket error");
                break;
            }
        }
    }

    multiplexer.close(gid);
    if tokio::time::timeout(WRITER_DRAIN, &mut writer).await.is_err() {
        writer.abort();
    }

    info!(gid = %gid, "WebSocket connection closed");
}
