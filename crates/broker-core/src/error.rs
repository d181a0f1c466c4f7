//! Unified application error types for the broker.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Every error can be rendered as the
//! OAuth2-style [`ErrorResponse`] envelope that travels back to clients
//! over HTTP and over the real-time channel.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::types::response::ErrorResponse;

/// Top-level error kind categorization used across the entire broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A message could not be parsed or violates the wire protocol.
    Protocol,
    /// A message arrived on a resource path the broker does not serve.
    NotFound,
    /// Missing or invalid credentials, token, or a denied registration.
    Security,
    /// The presented token is well-formed but past its expiry window.
    TokenExpired,
    /// The query engine rejected or failed to execute a request.
    Execution,
    /// I/O failure talking to the query engine or over a connection.
    Transport,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An unexpected internal error occurred.
    Internal,
}

impl ErrorKind {
    /// HTTP status code used when this kind is surfaced to a client.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Protocol | Self::Serialization | Self::Execution => 400,
            Self::NotFound => 404,
            Self::Security | Self::TokenExpired => 401,
            Self::Transport => 502,
            Self::Configuration | Self::Internal => 500,
        }
    }

    /// Machine-readable error discriminator placed in the `error` field.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Protocol => "parsing_failed",
            Self::NotFound => "wrong_path",
            Self::Security => "invalid_client",
            Self::TokenExpired => "invalid_grant",
            Self::Execution => "execution_error",
            Self::Transport => "transport_error",
            Self::Configuration => "configuration_error",
            Self::Serialization => "serialization_error",
            Self::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol => write!(f, "PROTOCOL"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Security => write!(f, "SECURITY"),
            Self::TokenExpired => write!(f, "TOKEN_EXPIRED"),
            Self::Execution => write!(f, "EXECUTION"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout the broker.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Overrides the default `error` discriminator of the kind.
    pub code: Option<&'static str>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Replace the `error` discriminator reported to clients.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Create a protocol (malformed message) error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    /// Create a wrong-resource-path error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a security error.
    pub fn security(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Security, message)
    }

    /// Create a token-expired error.
    pub fn token_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenExpired, message)
    }

    /// Create a query-engine execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Execution, message)
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns the HTTP-style status code for this error.
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Returns the `error` discriminator for this error.
    pub fn error_code(&self) -> &'static str {
        self.code.unwrap_or_else(|| self.kind.error_code())
    }

    /// Build the wire envelope for this error.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.status_code(), self.error_code(), self.message.clone())
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            code: self.code,
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Transport, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self.kind, ErrorKind::Internal | ErrorKind::Configuration) {
            tracing::error!(error = %self.message, "Internal server error");
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(self.to_response())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_codes() {
        assert_eq!(AppError::protocol("bad").status_code(), 400);
        assert_eq!(AppError::not_found("path").status_code(), 404);
        assert_eq!(AppError::security("no token").status_code(), 401);
        assert_eq!(AppError::token_expired("late").status_code(), 401);
        assert_eq!(AppError::transport("down").status_code(), 502);
    }

    #[test]
    fn test_expired_token_discriminator() {
        let resp = AppError::token_expired("Token expired").to_response();
        assert_eq!(resp.error, "invalid_grant");
        assert!(resp.is_token_expired());

        let resp = AppError::security("Missing token").to_response();
        assert_eq!(resp.error, "invalid_client");
        assert!(!resp.is_token_expired());
    }

    #[test]
    fn test_code_override() {
        let err = AppError::security("denied").with_code("unauthorized_client");
        assert_eq!(err.error_code(), "unauthorized_client");
        assert_eq!(err.clone().error_code(), "unauthorized_client");
    }
}
