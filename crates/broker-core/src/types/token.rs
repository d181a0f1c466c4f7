//! Access token claims and the opaque token wrapper.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// Claims carried by every access token the broker issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity uid.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiration (Unix seconds).
    pub exp: i64,
    /// Unique token id.
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// Validity window length in seconds.
    pub fn expiry_period(&self) -> i64 {
        self.exp - self.iat
    }

    /// Whether the token is expired at `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.iat + self.expiry_period()
    }

    /// Expiration as a UTC timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A signed token in compact JWS form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the claim set without verifying the signature.
    ///
    /// Signature verification is the job of the token decoder; the registry
    /// only needs the timestamps of tokens it issued itself.
    pub fn claims(&self) -> AppResult<Claims> {
        let payload = self
            .0
            .split('.')
            .nth(1)
            .ok_or_else(|| AppError::security("Token is not a compact JWS"))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AppError::with_source(ErrorKind::Security, "Token payload is not base64url", e))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::with_source(ErrorKind::Security, "Token claims are unreadable", e))
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let head: String = self.0.chars().take(8).collect();
        write!(f, "Token({head}…)")
    }
}
