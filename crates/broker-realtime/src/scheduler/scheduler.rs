//! The scheduler: single admission point for requests coming from gates
//! and from the HTTP surface.
//!
//! Updates are serialized by the write side of `update_lock` and cover the
//! engine update, the re-evaluation of every subscription, the hand-off of
//! notifications and the commit of the new snapshots. Subscribe and
//! unsubscribe take the read side, so no diff interleaves with seeding a
//! subscription. Queries run without the lock.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use broker_auth::AuthorizationService;
use broker_core::config::scheduler::SchedulerConfig;
use broker_core::error::AppError;
use broker_core::result::AppResult;
use broker_core::traits::QueryEngine;
use broker_core::types::{GateId, Notification, ResultSet, SparqlPattern, SubscriptionId};

use super::dispatch::{Delivery, GateDispatcher};
use super::table::{Subscription, SubscriptionTable};
use crate::message::{InboundMessage, OutboundMessage};
use crate::metrics::GateMetrics;

/// Admits requests, keeps the subscription table and computes
/// notifications.
#[derive(Debug)]
pub struct Scheduler {
    engine: Arc<dyn QueryEngine>,
    auth: Arc<AuthorizationService>,
    gates: Arc<dyn GateDispatcher>,
    subscriptions: SubscriptionTable,
    update_lock: RwLock<()>,
    metrics: Arc<GateMetrics>,
    max_subscriptions_per_gate: usize,
    engine_timeout: Option<Duration>,
}

impl Scheduler {
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        auth: Arc<AuthorizationService>,
        gates: Arc<dyn GateDispatcher>,
        metrics: Arc<GateMetrics>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            auth,
            gates,
            subscriptions: SubscriptionTable::new(),
            update_lock: RwLock::new(()),
            metrics,
            max_subscriptions_per_gate: config.max_subscriptions_per_gate,
            engine_timeout: None,
        }
    }

    /// Bounds every engine call; an expired call fails with a transport
    /// error.
    pub fn with_engine_timeout(mut self, timeout: Duration) -> Self {
        self.engine_timeout = Some(timeout);
        self
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn engine(&self) -> &Arc<dyn QueryEngine> {
        &self.engine
    }

    /// Handles one request from a gate and sends the reply to it.
    pub async fn process(&self, gid: GateId, msg: InboundMessage) {
        let kind = msg.kind();
        let bearer = msg.bearer();
        let authorization = bearer.as_deref();

        let outcome = match msg {
            InboundMessage::Subscribe {
                sparql,
                bindings,
                alias,
                ..
            } => {
                let pattern = SparqlPattern::new(sparql).with_bindings(bindings);
                self.subscribe(gid, pattern, alias, authorization)
                    .await
                    .map(|_| None)
            }
            InboundMessage::Unsubscribe { spuid, .. } => self
                .unsubscribe(gid, spuid)
                .await
                .map(|spuid| Some(OutboundMessage::UnsubscribeResponse { spuid })),
            InboundMessage::Update { sparql, .. } => self
                .update(&sparql, authorization)
                .await
                .map(|()| Some(OutboundMessage::UpdateResponse {})),
            InboundMessage::Query {
                sparql, bindings, ..
            } => {
                let pattern = SparqlPattern::new(sparql).with_bindings(bindings);
                self.query(&pattern, authorization)
                    .await
                    .map(|results| Some(OutboundMessage::QueryResponse { results }))
            }
        };

        match outcome {
            Ok(Some(reply)) => {
                let is_unsubscribe = matches!(reply, OutboundMessage::UnsubscribeResponse { .. });
                if self.gates.dispatch(gid, reply) == Delivery::Delivered && is_unsubscribe {
                    GateMetrics::inc(&self.metrics.unsubscribe_responses);
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(gid = %gid, request = kind, error = %err, "Request failed");
                if self.gates.dispatch(gid, OutboundMessage::from(&err)) == Delivery::Delivered {
                    GateMetrics::inc(&self.metrics.error_responses);
                }
            }
        }
    }

    /// Registers a subscription for `gid` and sends it the subscribe
    /// response carrying the initial results.
    pub async fn subscribe(
        &self,
        gid: GateId,
        pattern: SparqlPattern,
        alias: Option<String>,
        authorization: Option<&str>,
    ) -> AppResult<SubscriptionId> {
        self.auth.authorize(authorization)?;

        if self.subscriptions.count_for(gid) >= self.max_subscriptions_per_gate {
            return Err(AppError::protocol(format!(
                "Subscription limit of {} reached for this connection",
                self.max_subscriptions_per_gate
            )));
        }

        let _guard = self.update_lock.read().await;

        let initial = self.bounded(self.engine.execute(&pattern)).await?;
        let subscription = Subscription::new(gid, pattern, alias.clone(), initial.clone());
        let spuid = subscription.spuid;
        self.subscriptions.insert(subscription);

        let response = OutboundMessage::SubscribeResponse {
            spuid,
            alias,
            initial_results: initial,
        };
        match self.gates.dispatch(gid, response) {
            Delivery::Delivered => {
                GateMetrics::inc(&self.metrics.subscribe_responses);
                info!(gid = %gid, spuid = %spuid, "Subscription registered");
                Ok(spuid)
            }
            delivery => {
                self.subscriptions.remove(&spuid);
                Err(AppError::transport(format!(
                    "Subscribe response not delivered ({delivery:?})"
                )))
            }
        }
    }

    /// Removes a subscription owned by `gid`. Unknown IDs succeed.
    ///
    /// Requires no token, so an expired one does not pin subscriptions.
    pub async fn unsubscribe(
        &self,
        gid: GateId,
        spuid: SubscriptionId,
    ) -> AppResult<SubscriptionId> {
        let _guard = self.update_lock.read().await;
        if self.subscriptions.remove_owned(gid, &spuid) {
            info!(gid = %gid, spuid = %spuid, "Subscription removed");
        } else {
            debug!(gid = %gid, spuid = %spuid, "Unsubscribe for unknown subscription");
        }
        Ok(spuid)
    }

    /// Applies an update and notifies every subscription whose results
    /// changed.
    pub async fn update(&self, sparql: &str, authorization: Option<&str>) -> AppResult<()> {
        self.auth.authorize(authorization)?;

        let _guard = self.update_lock.write().await;
        self.bounded(self.engine.update(sparql)).await?;
        let notified = self.reevaluate().await;

        debug!(notified, "Update applied");
        Ok(())
    }

    /// Evaluates a pattern once.
    pub async fn query(
        &self,
        pattern: &SparqlPattern,
        authorization: Option<&str>,
    ) -> AppResult<ResultSet> {
        self.auth.authorize(authorization)?;
        self.bounded(self.engine.execute(pattern)).await
    }

    /// Drops every subscription of a closing gate.
    pub fn unregister_gate(&self, gid: GateId) -> usize {
        let removed = self.subscriptions.remove_gate(gid);
        if !removed.is_empty() {
            info!(gid = %gid, count = removed.len(), "Subscriptions of closed gate removed");
        }
        removed.len()
    }

    /// Clears every subscription.
    pub fn shutdown(&self) {
        for subscription in self.subscriptions.snapshot() {
            self.subscriptions.remove(&subscription.spuid);
        }
    }

    /// Re-runs every subscription against the current store. Must be called
    /// with the write side of `update_lock` held.
    async fn reevaluate(&self) -> usize {
        let subscriptions = self.subscriptions.snapshot();
        let results = join_all(
            subscriptions
                .iter()
                .map(|s| self.bounded(self.engine.execute(&s.pattern))),
        )
        .await;

        let mut notified = 0;
        for (subscription, result) in subscriptions.into_iter().zip(results) {
            let current = match result {
                Ok(current) => current,
                Err(err) => {
                    warn!(spuid = %subscription.spuid, error = %err, "Re-evaluation failed");
                    continue;
                }
            };

            let diff = subscription.last.diff(&current);
            if diff.is_empty() {
                continue;
            }

            let sequence = subscription.sequence + 1;
            let notification = Notification::new(subscription.spuid, sequence, diff);
            match self
                .gates
                .dispatch(subscription.gid, OutboundMessage::Notification(notification))
            {
                Delivery::Delivered => {
                    if self
                        .subscriptions
                        .commit(&subscription.spuid, current, sequence)
                    {
                        GateMetrics::inc(&self.metrics.notifications);
                        notified += 1;
                    }
                }
                Delivery::GateClosed => {
                    self.subscriptions.remove(&subscription.spuid);
                    debug!(spuid = %subscription.spuid, "Dropped subscription of closed gate");
                }
                Delivery::Busy => {
                    warn!(
                        gid = %subscription.gid,
                        spuid = %subscription.spuid,
                        "Notification deferred, gate is busy"
                    );
                }
            }
        }
        notified
    }

    async fn bounded<T>(&self, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        match self.engine_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                AppError::transport(format!(
                    "Query engine did not answer within {} ms",
                    limit.as_millis()
                ))
            })?,
            None => fut.await,
        }
    }
}
