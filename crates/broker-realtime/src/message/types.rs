//! Inbound and outbound message type definitions.

use serde::{Deserialize, Serialize};

use broker_core::error::AppError;
use broker_core::types::{Binding, ErrorResponse, Notification, ResultSet, SubscriptionId};

/// Messages sent by a client to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Start a subscription.
    Subscribe {
        sparql: String,
        /// Forced bindings applied to `sparql`.
        #[serde(default, skip_serializing_if = "Binding::is_empty")]
        bindings: Binding,
        /// Client label echoed in the response.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization: Option<String>,
    },
    /// Stop a subscription.
    Unsubscribe {
        spuid: SubscriptionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization: Option<String>,
    },
    /// Apply a SPARQL update.
    Update {
        sparql: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization: Option<String>,
    },
    /// One-shot query.
    Query {
        sparql: String,
        #[serde(default, skip_serializing_if = "Binding::is_empty")]
        bindings: Binding,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization: Option<String>,
    },
}

impl InboundMessage {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Subscribe { .. } => "subscribe",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::Update { .. } => "update",
            Self::Query { .. } => "query",
        }
    }

    /// The `Authorization` header value carried by the message, normalized
    /// to the `Bearer` scheme.
    pub fn bearer(&self) -> Option<String> {
        let raw = match self {
            Self::Subscribe { authorization, .. }
            | Self::Unsubscribe { authorization, .. }
            | Self::Update { authorization, .. }
            | Self::Query { authorization, .. } => authorization.as_deref()?,
        };
        let has_scheme = raw
            .split_once(' ')
            .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"));
        Some(if has_scheme {
            raw.to_string()
        } else {
            format!("Bearer {raw}")
        })
    }
}

/// Messages sent by the broker to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Subscription accepted; carries the initial result set.
    SubscribeResponse {
        spuid: SubscriptionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        initial_results: ResultSet,
    },
    /// Subscription removed.
    UnsubscribeResponse { spuid: SubscriptionId },
    /// Added/removed solutions after an update.
    Notification(Notification),
    /// Update applied.
    UpdateResponse {},
    /// Query results.
    QueryResponse { results: ResultSet },
    /// Any failure.
    Error(ErrorResponse),
}

impl OutboundMessage {
    /// Serializes the message to its JSON frame.
    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string(self).map_err(AppError::from)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<&AppError> for OutboundMessage {
    fn from(err: &AppError) -> Self {
        Self::Error(err.to_response())
    }
}
