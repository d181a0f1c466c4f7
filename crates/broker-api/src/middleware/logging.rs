//! Request/response logging middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info, warn};

/// Logs method, path, status and latency of each HTTP exchange.
///
/// Health probes are logged at debug level. Rejected credentials and
/// server-side failures are raised to warn.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let bearer = request.headers().contains_key(header::AUTHORIZATION);
    let upgrade = request.headers().contains_key(header::UPGRADE);
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_millis();

    if path == "/health" {
        debug!(status, elapsed_ms = %elapsed_ms, "Health probe");
    } else if status == 401 || status >= 500 {
        warn!(
            method = %method,
            path = %path,
            status,
            bearer,
            elapsed_ms = %elapsed_ms,
            "HTTP request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status,
            upgrade,
            elapsed_ms = %elapsed_ms,
            "HTTP request"
        );
    }

    response
}
