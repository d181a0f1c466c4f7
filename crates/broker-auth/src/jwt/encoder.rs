//! JWT token creation.

use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use broker_core::config::auth::AuthConfig;
use broker_core::error::AppError;
use broker_core::types::{Claims, Token};

/// Creates HS256-signed access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").finish_non_exhaustive()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Signs a token for `subject` valid from `issued_at` for `period` seconds.
    pub fn issue(
        &self,
        subject: &str,
        issuer: &str,
        issued_at: i64,
        period: i64,
    ) -> Result<Token, AppError> {
        let claims = Claims {
            sub: subject.to_string(),
            iss: issuer.to_string(),
            iat: issued_at,
            exp: issued_at + period,
            jti: Uuid::new_v4().to_string(),
        };

        let raw = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok(Token::new(raw))
    }
}
