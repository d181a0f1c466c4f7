//! Digital identities and the credentials attached to them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Class of a digital identity; selects the default token expiry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityClass {
    /// A physical device (long-lived tokens).
    Device,
    /// A backend application.
    #[default]
    Application,
    /// A human user (short-lived tokens).
    User,
    /// Test identities.
    Test,
}

impl fmt::Display for IdentityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "device"),
            Self::Application => write!(f, "application"),
            Self::User => write!(f, "user"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// A user/secret pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Immutable description of a party allowed to talk to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalIdentity {
    /// Unique identifier of the identity.
    pub uid: String,
    /// Policy class.
    pub class: IdentityClass,
    /// Credentials the broker uses on the identity's behalf against the
    /// backing SPARQL endpoint, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_credentials: Option<Credentials>,
}

impl DigitalIdentity {
    pub fn new(uid: impl Into<String>, class: IdentityClass) -> Self {
        Self {
            uid: uid.into(),
            class,
            endpoint_credentials: None,
        }
    }

    pub fn device(uid: impl Into<String>) -> Self {
        Self::new(uid, IdentityClass::Device)
    }

    pub fn application(uid: impl Into<String>) -> Self {
        Self::new(uid, IdentityClass::Application)
    }

    pub fn user(uid: impl Into<String>) -> Self {
        Self::new(uid, IdentityClass::User)
    }

    /// Attach endpoint credentials.
    pub fn with_endpoint_credentials(mut self, credentials: Credentials) -> Self {
        self.endpoint_credentials = Some(credentials);
        self
    }
}
