//! JWT signature and issuer verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use broker_core::config::auth::AuthConfig;
use broker_core::error::AppError;
use broker_core::types::Claims;

/// Verifies tokens signed by [`super::JwtEncoder`].
///
/// Expiry is deliberately not checked here: the registry's expiry period
/// is authoritative and the caller reports expiry as its own error kind.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iss", "iat", "exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes a token, checking signature and issuer.
    pub fn decode(&self, token: &str, issuer: &str) -> Result<Claims, AppError> {
        let mut validation = self.validation.clone();
        validation.set_issuer(&[issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::security("Invalid token format")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::security("Invalid token signature")
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AppError::security("Token issued by another authority")
                }
                _ => AppError::security(format!("Token validation failed: {e}")),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_round_trip_keeps_claims() {
        let cfg = config("k1");
        let token = JwtEncoder::new(&cfg)
            .issue("dev-1", "urn:iss", 1_000, 60)
            .expect("issue");
        let claims = JwtDecoder::new(&cfg)
            .decode(token.as_str(), "urn:iss")
            .expect("decode");
        assert_eq!(claims.sub, "dev-1");
        assert_eq!(claims.expiry_period(), 60);
        assert_eq!(token.claims().expect("claims"), claims);
    }

    #[test]
    fn test_expired_token_still_decodes() {
        let cfg = config("k1");
        let token = JwtEncoder::new(&cfg)
            .issue("dev-1", "urn:iss", 10, 5)
            .expect("issue");
        assert!(JwtDecoder::new(&cfg).decode(token.as_str(), "urn:iss").is_ok());
    }

    #[test]
    fn test_wrong_key_or_issuer_rejected() {
        let token = JwtEncoder::new(&config("k1"))
            .issue("dev-1", "urn:iss", chrono::Utc::now().timestamp(), 60)
            .expect("issue");

        let err = JwtDecoder::new(&config("k2"))
            .decode(token.as_str(), "urn:iss")
            .unwrap_err();
        assert_eq!(err.kind, broker_core::ErrorKind::Security);

        let err = JwtDecoder::new(&config("k1"))
            .decode(token.as_str(), "urn:other")
            .unwrap_err();
        assert_eq!(err.kind, broker_core::ErrorKind::Security);
    }

    #[test]
    fn test_garbage_rejected() {
        let err = JwtDecoder::new(&config("k1"))
            .decode("not.a.jwt", "urn:iss")
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_client");
    }
}
