//! Live subscriptions keyed by SPUID with an owner-gate back index.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use broker_core::types::{GateId, ResultSet, SparqlPattern, SubscriptionId};

/// One live subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub spuid: SubscriptionId,
    /// Owning gate
    pub gid: GateId,
    /// Query with its forced bindings
    pub pattern: SparqlPattern,
    pub alias: Option<String>,
    /// Last result set delivered to the owner
    pub last: ResultSet,
    /// Sequence number of the last delivered notification
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(
        gid: GateId,
        pattern: SparqlPattern,
        alias: Option<String>,
        initial: ResultSet,
    ) -> Self {
        Self {
            spuid: SubscriptionId::new(),
            gid,
            pattern,
            alias,
            last: initial,
            sequence: 0,
            created_at: Utc::now(),
        }
    }
}

/// Concurrent subscription table.
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    subscriptions: DashMap<SubscriptionId, Subscription>,
    by_gate: DashMap<GateId, HashSet<SubscriptionId>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, subscription: Subscription) {
        self.by_gate
            .entry(subscription.gid)
            .or_default()
            .insert(subscription.spuid);
        self.subscriptions.insert(subscription.spuid, subscription);
    }

    pub fn get(&self, spuid: &SubscriptionId) -> Option<Subscription> {
        self.subscriptions.get(spuid).map(|s| s.clone())
    }

    pub fn remove(&self, spuid: &SubscriptionId) -> Option<Subscription> {
        let (_, subscription) = self.subscriptions.remove(spuid)?;
        self.unindex(subscription.gid, spuid);
        Some(subscription)
    }

    /// Removes `spuid` only when `gid` owns it.
    pub fn remove_owned(&self, gid: GateId, spuid: &SubscriptionId) -> bool {
        match self.subscriptions.remove_if(spuid, |_, s| s.gid == gid) {
            Some(_) => {
                self.unindex(gid, spuid);
                true
            }
            None => false,
        }
    }

    /// Drops every subscription owned by `gid`.
    pub fn remove_gate(&self, gid: GateId) -> Vec<SubscriptionId> {
        let Some((_, spuids)) = self.by_gate.remove(&gid) else {
            return Vec::new();
        };
        spuids
            .into_iter()
            .filter(|spuid| self.subscriptions.remove(spuid).is_some())
            .collect()
    }

    pub fn count_for(&self, gid: GateId) -> usize {
        self.by_gate.get(&gid).map(|s| s.len()).unwrap_or(0)
    }

    /// Cloned view of every subscription. No map guard outlives the call.
    pub fn snapshot(&self) -> Vec<Subscription> {
        self.subscriptions.iter().map(|e| e.value().clone()).collect()
    }

    /// Records a delivered notification. Returns `false` if the
    /// subscription disappeared meanwhile.
    pub fn commit(&self, spuid: &SubscriptionId, current: ResultSet, sequence: u64) -> bool {
        match self.subscriptions.get_mut(spuid) {
            Some(mut subscription) => {
                subscription.last = current;
                subscription.sequence = sequence;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    fn unindex(&self, gid: GateId, spuid: &SubscriptionId) {
        if let Some(mut spuids) = self.by_gate.get_mut(&gid) {
            spuids.remove(spuid);
        }
        self.by_gate.remove_if(&gid, |_, spuids| spuids.is_empty());
    }
}
