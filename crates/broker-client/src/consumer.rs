//! Callbacks for subscription events.

use tokio::sync::mpsc;

use broker_core::types::{ErrorResponse, Notification, ResultSet, SubscriptionId};
use broker_realtime::OutboundMessage;

/// Receives what the broker pushes on the subscribe channel.
///
/// Every method has an empty default so consumers implement only what they
/// use.
pub trait Consumer: Send + Sync + 'static {
    /// Subscription accepted with its initial results.
    fn on_subscribe(&self, _spuid: SubscriptionId, _alias: Option<&str>, _initial: &ResultSet) {}

    /// A full notification, before `on_added`/`on_removed`.
    fn on_results(&self, _notification: &Notification) {}

    fn on_added(&self, _spuid: SubscriptionId, _added: &ResultSet) {}

    fn on_removed(&self, _spuid: SubscriptionId, _removed: &ResultSet) {}

    fn on_unsubscribe(&self, _spuid: SubscriptionId) {}

    fn on_error(&self, _error: &ErrorResponse) {}

    /// Update and query responses.
    fn on_response(&self, _msg: &OutboundMessage) {}

    /// The channel closed.
    fn on_close(&self) {}
}

/// Routes a received message to the matching callbacks.
pub fn deliver(consumer: &dyn Consumer, msg: &OutboundMessage) {
    match msg {
        OutboundMessage::SubscribeResponse {
            spuid,
            alias,
            initial_results,
        } => consumer.on_subscribe(*spuid, alias.as_deref(), initial_results),
        OutboundMessage::Notification(notification) => {
            consumer.on_results(notification);
            if !notification.added.is_empty() {
                consumer.on_added(notification.spuid, &notification.added);
            }
            if !notification.removed.is_empty() {
                consumer.on_removed(notification.spuid, &notification.removed);
            }
        }
        OutboundMessage::UnsubscribeResponse { spuid } => consumer.on_unsubscribe(*spuid),
        OutboundMessage::Error(err) => consumer.on_error(err),
        OutboundMessage::UpdateResponse {} | OutboundMessage::QueryResponse { .. } => {
            consumer.on_response(msg)
        }
    }
}

/// Forwards every message into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelConsumer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Consumer for ChannelConsumer {
    fn on_subscribe(&self, spuid: SubscriptionId, alias: Option<&str>, initial: &ResultSet) {
        let _ = self.tx.send(OutboundMessage::SubscribeResponse {
            spuid,
            alias: alias.map(str::to_owned),
            initial_results: initial.clone(),
        });
    }

    fn on_results(&self, notification: &Notification) {
        let _ = self
            .tx
            .send(OutboundMessage::Notification(notification.clone()));
    }

    fn on_unsubscribe(&self, spuid: SubscriptionId) {
        let _ = self.tx.send(OutboundMessage::UnsubscribeResponse { spuid });
    }

    fn on_error(&self, error: &ErrorResponse) {
        let _ = self.tx.send(OutboundMessage::Error(error.clone()));
    }

    fn on_response(&self, msg: &OutboundMessage) {
        let _ = self.tx.send(msg.clone());
    }
}
