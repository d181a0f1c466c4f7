//! Change notification pushed to a subscriber.

use serde::{Deserialize, Serialize};

use super::id::SubscriptionId;
use super::rdf::{ResultDiff, ResultSet};

/// Added/removed solutions of one subscription after an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub spuid: SubscriptionId,
    /// Per-subscription counter; the first notification is 1.
    pub sequence: u64,
    pub added: ResultSet,
    pub removed: ResultSet,
}

impl Notification {
    pub fn new(spuid: SubscriptionId, sequence: u64, diff: ResultDiff) -> Self {
        Self {
            spuid,
            sequence,
            added: diff.added,
            removed: diff.removed,
        }
    }
}
