//! Subscribe channel tests against a live broker.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use broker_client::{ChannelConsumer, SecurityManager, SparqlClient, SubscriptionClient};
use broker_core::types::Binding;
use broker_realtime::OutboundMessage;

use crate::helpers::{
    DELETE, INSERT, LiveBroker, PATTERN, TEST_IDENTITY, UNRELATED, bindings, test_config,
};

const QUIET: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_added_removed_and_unrelated_updates() {
    let broker = LiveBroker::open().await;
    let sparql = SparqlClient::new(broker.http_url());
    let mut ws = broker.connect("/subscribe").await;

    ws.send(json!({"type": "subscribe", "sparql": PATTERN, "alias": "mine"}))
        .await;
    let reply = ws.recv().await;
    assert_eq!(reply["type"], "subscribe_response");
    assert_eq!(reply["alias"], "mine");
    assert!(bindings(&reply["initial_results"]).is_empty());
    let spuid = reply["spuid"].clone();

    sparql.update(INSERT).await.expect("insert");
    let note = ws.recv().await;
    assert_eq!(note["type"], "notification");
    assert_eq!(note["spuid"], spuid);
    assert_eq!(note["sequence"], 1);
    assert_eq!(bindings(&note["added"]).len(), 1);
    assert!(bindings(&note["removed"]).is_empty());

    sparql.update(DELETE).await.expect("delete");
    let note = ws.recv().await;
    assert_eq!(note["sequence"], 2);
    assert!(bindings(&note["added"]).is_empty());
    assert_eq!(bindings(&note["removed"]).len(), 1);

    sparql.update(UNRELATED).await.expect("unrelated");
    ws.expect_silence(QUIET).await;

    ws.close().await;
    broker.stop().await;
}

#[tokio::test]
async fn test_initial_results_reflect_existing_data() {
    let broker = LiveBroker::open().await;
    SparqlClient::new(broker.http_url())
        .update(INSERT)
        .await
        .expect("insert");

    let mut ws = broker.connect("/subscribe").await;
    ws.send(json!({"type": "subscribe", "sparql": PATTERN})).await;
    let reply = ws.recv().await;
    assert_eq!(bindings(&reply["initial_results"]).len(), 1);

    broker.stop().await;
}

#[tokio::test]
async fn test_each_gate_notified_once() {
    let broker = LiveBroker::open().await;
    let mut first = broker.connect("/subscribe").await;
    let mut second = broker.connect("/subscribe").await;
    first.subscribe(PATTERN).await;
    second.subscribe(PATTERN).await;

    SparqlClient::new(broker.http_url())
        .update(INSERT)
        .await
        .expect("insert");

    for ws in [&mut first, &mut second] {
        let note = ws.recv().await;
        assert_eq!(note["type"], "notification");
        assert_eq!(note["sequence"], 1);
        ws.expect_silence(QUIET).await;
    }

    broker.stop().await;
}

#[tokio::test]
async fn test_update_over_channel() {
    let broker = LiveBroker::open().await;
    let mut ws = broker.connect("/subscribe").await;
    ws.subscribe(PATTERN).await;

    ws.send(json!({"type": "update", "sparql": INSERT})).await;
    let mut kinds = vec![
        ws.recv().await["type"].as_str().map(str::to_owned),
        ws.recv().await["type"].as_str().map(str::to_owned),
    ];
    kinds.sort();
    assert_eq!(
        kinds,
        vec![
            Some("notification".to_string()),
            Some("update_response".to_string())
        ]
    );

    ws.send(json!({"type": "query", "sparql": PATTERN})).await;
    let reply = ws.recv().await;
    assert_eq!(reply["type"], "query_response");
    assert_eq!(bindings(&reply["results"]).len(), 1);

    broker.stop().await;
}

#[tokio::test]
async fn test_failed_update_sends_no_notification() {
    let broker = LiveBroker::open().await;
    let mut ws = broker.connect("/subscribe").await;
    ws.subscribe(PATTERN).await;

    ws.send(json!({"type": "update", "sparql": "INSERT DATA { <http://ex/s> "}))
        .await;
    let reply = ws.recv().await;
    assert_eq!(reply["status_code"], 400);
    assert!(reply["error"].is_string());
    ws.expect_silence(QUIET).await;

    // The snapshot is unchanged, so the next change starts at sequence 1.
    SparqlClient::new(broker.http_url())
        .update(INSERT)
        .await
        .expect("insert");
    let note = ws.recv().await;
    assert_eq!(note["sequence"], 1);
    assert_eq!(bindings(&note["added"]).len(), 1);

    broker.stop().await;
}

#[tokio::test]
async fn test_unsubscribe_after_token_expiry() {
    let mut config = test_config(true);
    config.auth.expiry.test_seconds = 1;
    let broker = LiveBroker::start(config).await;
    let security = SecurityManager::new(broker.http_url());
    security.register(TEST_IDENTITY).await.expect("register");
    let bearer = security.bearer().await.expect("bearer");

    let mut ws = broker.connect("/subscribe").await;
    ws.send(json!({"type": "subscribe", "sparql": PATTERN, "authorization": bearer}))
        .await;
    let spuid = ws.recv().await["spuid"].clone();

    tokio::time::sleep(Duration::from_secs(2)).await;
    ws.send(json!({"type": "unsubscribe", "spuid": spuid, "authorization": bearer}))
        .await;
    let reply = ws.recv().await;
    assert_eq!(reply["type"], "unsubscribe_response");
    assert!(broker.state.realtime.scheduler.subscriptions().is_empty());

    broker.stop().await;
}

#[tokio::test]
async fn test_unsubscribe_twice() {
    let broker = LiveBroker::open().await;
    let mut ws = broker.connect("/subscribe").await;
    let spuid = ws.subscribe(PATTERN).await;

    for _ in 0..2 {
        ws.send(json!({"type": "unsubscribe", "spuid": spuid})).await;
        let reply = ws.recv().await;
        assert_eq!(reply["type"], "unsubscribe_response");
        assert_eq!(reply["spuid"], spuid.as_str());
    }

    SparqlClient::new(broker.http_url())
        .update(INSERT)
        .await
        .expect("insert");
    ws.expect_silence(QUIET).await;

    broker.stop().await;
}

#[tokio::test]
async fn test_closed_gate_drops_its_subscriptions() {
    let broker = LiveBroker::open().await;
    let mut ws = broker.connect("/subscribe").await;
    ws.subscribe(PATTERN).await;
    ws.subscribe(PATTERN).await;
    assert_eq!(broker.state.realtime.scheduler.subscriptions().len(), 2);

    ws.close().await;
    assert!(
        broker
            .eventually(|state| state.realtime.scheduler.subscriptions().is_empty())
            .await
    );
    assert!(
        broker
            .eventually(|state| state.realtime.metrics.snapshot().active_gates == 0)
            .await
    );

    SparqlClient::new(broker.http_url())
        .update(INSERT)
        .await
        .expect("update after close");

    broker.stop().await;
}

#[tokio::test]
async fn test_wrong_path() {
    let broker = LiveBroker::open().await;
    let mut ws = broker.connect("/elsewhere").await;

    ws.send(json!({"type": "subscribe", "sparql": PATTERN})).await;
    let reply = ws.recv().await;
    assert_eq!(reply["status_code"], 404);
    assert_eq!(reply["error"], "wrong_path");
    assert!(
        reply["error_description"]
            .as_str()
            .is_some_and(|d| d.contains("/subscribe"))
    );
    assert!(broker.state.realtime.scheduler.subscriptions().is_empty());

    broker.stop().await;
}

#[tokio::test]
async fn test_malformed_message_keeps_gate_open() {
    let broker = LiveBroker::open().await;
    let mut ws = broker.connect("/subscribe").await;

    ws.send_raw("{not json").await;
    let reply = ws.recv().await;
    assert_eq!(reply["status_code"], 400);
    assert_eq!(reply["error"], "parsing_failed");

    ws.subscribe(PATTERN).await;
    assert_eq!(broker.state.realtime.metrics.snapshot().errors, 1);

    broker.stop().await;
}

#[tokio::test]
async fn test_invalid_utf8_binary_frame_is_rejected() {
    let broker = LiveBroker::open().await;
    let mut ws = broker.connect("/subscribe").await;

    ws.send_binary(vec![0xff, 0xfe, 0x7b]).await;
    let reply = ws.recv().await;
    assert_eq!(reply["status_code"], 400);
    assert_eq!(reply["error"], "parsing_failed");

    ws.subscribe(PATTERN).await;
    assert_eq!(broker.state.realtime.metrics.snapshot().errors, 1);

    broker.stop().await;
}

#[tokio::test]
async fn test_secured_channel_requires_token() {
    let broker = LiveBroker::start(test_config(true)).await;
    let mut ws = broker.connect("/subscribe").await;

    ws.send(json!({"type": "subscribe", "sparql": PATTERN})).await;
    let reply = ws.recv().await;
    assert_eq!(reply["status_code"], 401);
    assert!(broker.state.realtime.scheduler.subscriptions().is_empty());

    let security = Arc::new(SecurityManager::new(broker.http_url()));
    security.register(TEST_IDENTITY).await.expect("register");
    let bearer = security.bearer().await.expect("bearer");

    ws.send(json!({
        "type": "subscribe",
        "sparql": PATTERN,
        "authorization": bearer,
    }))
    .await;
    let reply = ws.recv().await;
    assert_eq!(reply["type"], "subscribe_response");

    SparqlClient::new(broker.http_url())
        .with_security(security)
        .update(INSERT)
        .await
        .expect("secured update");
    assert_eq!(ws.recv().await["type"], "notification");

    broker.stop().await;
}

#[tokio::test]
async fn test_subscription_client_delivers_to_consumer() {
    let broker = LiveBroker::open().await;
    let (consumer, mut events) = ChannelConsumer::new();
    let client = SubscriptionClient::connect(&broker.handle.ws_url("/subscribe"), Arc::new(consumer))
        .await
        .expect("connect");

    client
        .subscribe(PATTERN, Binding::default(), Some("watch"))
        .await
        .expect("subscribe");
    let spuid = match next_event(&mut events).await {
        OutboundMessage::SubscribeResponse { spuid, alias, .. } => {
            assert_eq!(alias.as_deref(), Some("watch"));
            spuid
        }
        other => panic!("Expected subscribe response, got {other:?}"),
    };

    client.update(INSERT).await.expect("update");
    let mut saw_notification = false;
    for _ in 0..2 {
        match next_event(&mut events).await {
            OutboundMessage::Notification(note) => {
                assert_eq!(note.spuid, spuid);
                assert_eq!(note.added.len(), 1);
                saw_notification = true;
            }
            OutboundMessage::UpdateResponse {} => {}
            other => panic!("Unexpected message {other:?}"),
        }
    }
    assert!(saw_notification);

    client.unsubscribe(spuid).await.expect("unsubscribe");
    assert!(matches!(
        next_event(&mut events).await,
        OutboundMessage::UnsubscribeResponse { .. }
    ));

    client.close().await.expect("close");
    broker.stop().await;
}

async fn next_event(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<OutboundMessage>,
) -> OutboundMessage {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("Timed out waiting for an event")
        .expect("Consumer channel closed")
}
