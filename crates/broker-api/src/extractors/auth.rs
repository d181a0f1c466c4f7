//! Raw `Authorization` header extractor.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// The request's `Authorization` header, if present and valid UTF-8.
///
/// Validation is left to the authorization service so that a disabled
/// security layer accepts requests without the header.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationHeader(pub Option<String>);

impl AuthorizationHeader {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthorizationHeader {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        ))
    }
}
