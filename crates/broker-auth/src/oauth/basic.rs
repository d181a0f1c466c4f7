//! `Authorization` header parsing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use broker_core::error::AppError;

/// Decodes `Basic base64(id:secret)` into its two parts.
pub fn parse_basic(header: &str) -> Result<(String, String), AppError> {
    let encoded = strip_scheme(header, "Basic")
        .ok_or_else(|| AppError::security("Expected Basic authorization"))?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AppError::security("Basic credentials are not base64"))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AppError::security("Basic credentials are not UTF-8"))?;

    let (id, secret) = decoded
        .split_once(':')
        .ok_or_else(|| AppError::security("Basic credentials must be id:secret"))?;

    Ok((id.to_string(), secret.to_string()))
}

/// Returns the token of a `Bearer` header.
pub fn parse_bearer(header: &str) -> Result<&str, AppError> {
    strip_scheme(header, "Bearer")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::security("Expected Bearer authorization"))
}

fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let header = header.trim_start();
    let (head, rest) = header.split_once(' ')?;
    head.eq_ignore_ascii_case(scheme).then_some(rest)
}
