//! Mapping of HTTP responses and error envelopes into [`AppError`].

use serde::de::DeserializeOwned;

use broker_core::error::{AppError, ErrorKind};
use broker_core::result::AppResult;
use broker_core::types::ErrorResponse;

/// Rebuilds an [`AppError`] from an error envelope sent by the broker.
pub fn from_error_response(resp: &ErrorResponse) -> AppError {
    let kind = match (resp.status_code, resp.error.as_str()) {
        (401, "invalid_grant") => ErrorKind::TokenExpired,
        (401, _) => ErrorKind::Security,
        (404, _) => ErrorKind::NotFound,
        (_, "execution_error") => ErrorKind::Execution,
        (400, _) => ErrorKind::Protocol,
        (502, _) => ErrorKind::Transport,
        _ => ErrorKind::Internal,
    };
    let err = AppError::new(kind, resp.error_description.clone());
    if resp.error == "unauthorized_client" {
        err.with_code("unauthorized_client")
    } else {
        err
    }
}

pub(crate) fn transport(err: reqwest::Error) -> AppError {
    AppError::with_source(ErrorKind::Transport, format!("Request failed: {err}"), err)
}

/// Decodes a successful body as `T`, or the error envelope otherwise.
pub(crate) async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> AppResult<T> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport)?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(AppError::from);
    }
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(envelope) => Err(from_error_response(&envelope)),
        Err(_) => Err(AppError::transport(format!("HTTP {status}: {body}"))),
    }
}
