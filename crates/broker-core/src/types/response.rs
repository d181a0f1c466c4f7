//! Wire envelopes shared by the HTTP surface, the real-time channel and
//! the client library.

use serde::{Deserialize, Serialize};

/// OAuth2-style error envelope. Clients detect errors by the presence of
/// the `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub error: String,
    pub error_description: String,
}

impl ErrorResponse {
    pub fn new(status_code: u16, error: &str, error_description: impl Into<String>) -> Self {
        Self {
            status_code,
            error: error.to_string(),
            error_description: error_description.into(),
        }
    }

    /// True when the error signals an expired token; the caller should
    /// refresh and retry once.
    pub fn is_token_expired(&self) -> bool {
        self.status_code == 401 && self.error == "invalid_grant"
    }
}

/// Body of a successful token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtResponse {
    pub access_token: String,
    pub token_type: String,
    /// Validity window in seconds.
    pub expires_in: i64,
    /// Unix seconds.
    pub issued_at: i64,
    /// Unix seconds.
    pub expires_at: i64,
}

/// Body of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub credentials: ClientCredentials,
}

/// Client id and secret handed out on registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub signature: Option<String>,
}

/// Body of a registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub register: RegisterBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBody {
    pub client_identity: String,
    #[serde(default)]
    pub grant_types: Vec<String>,
}

impl RegistrationRequest {
    pub fn client_credentials(client_identity: impl Into<String>) -> Self {
        Self {
            register: RegisterBody {
                client_identity: client_identity.into(),
                grant_types: vec!["client_credentials".to_string()],
            },
        }
    }
}
