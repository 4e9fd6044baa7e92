//! Integration tests for the real-time WebSocket protocol.

mod helpers;

use std::time::Duration;

use serde_json::json;

use hugmood_core::config::RealtimeConfig;
use hugmood_services::mock::MockBackend;

use helpers::TestServer;

#[tokio::test]
async fn test_anonymous_login_then_mood_update() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let user_id = client.login_anonymously().await;
    assert_eq!(user_id, "u1");

    client
        .send(json!({"type": "update_mood", "mood": "good", "callbackId": "c1"}))
        .await;
    let reply = client.recv().await;
    assert_eq!(reply["type"], "mood_update_success");
    assert_eq!(reply["callbackId"], "c1");
    assert_eq!(reply["mood"]["value"], "good");
}

#[tokio::test]
async fn test_hug_reaches_recipient_without_callback() {
    let server = TestServer::start().await;
    let (mut alice, _) = server.anonymous_client().await;
    let (mut bob, bob_id) = server.anonymous_client().await;

    alice
        .send(json!({"type": "send_hug", "recipientId": bob_id, "callbackId": "c2"}))
        .await;

    let reply = alice.recv_type("send_hug_success").await;
    assert_eq!(reply["callbackId"], "c2");

    let event = bob.recv_type("hug_received").await;
    assert!(event.get("callbackId").is_none());
    assert_eq!(event["hug"]["recipient"]["id"], bob_id);
}

#[tokio::test]
async fn test_requests_before_authentication_are_rejected() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    client
        .send(json!({"type": "fetch_data", "dataType": "mood_history", "callbackId": 1}))
        .await;
    let reply = client.recv().await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "Authentication required");
    assert_eq!(reply["callbackId"], 1);
    assert!(server.mock.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_frames_do_not_close_the_connection() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    client.send_raw("{not json").await;
    let reply = client.recv().await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["message"], "Invalid message format");

    client.send(json!({"type": "teleport", "callbackId": "t"})).await;
    let reply = client.recv().await;
    assert_eq!(reply["message"], "Unrecognized message type");
    assert_eq!(reply["callbackId"], "t");

    client.send(json!({"type": "ping", "callbackId": "p"})).await;
    let pong = client.recv().await;
    assert_eq!(pong["type"], "pong");
    assert_eq!(pong["callbackId"], "p");
}

#[tokio::test]
async fn test_login_failure_keeps_connection_usable() {
    let mock = MockBackend::new().with_account("amy", "secret", json!({"id": "u7"}));
    let server = TestServer::start_with(mock, RealtimeConfig::default()).await;
    let mut client = server.client().await;

    client
        .send(json!({
            "type": "authenticate",
            "method": "credentials",
            "credentials": {"emailOrUsername": "amy", "password": "wrong"}
        }))
        .await;
    let reply = client.recv().await;
    assert_eq!(reply["type"], "auth_error");
    assert_eq!(reply["message"], "Login failed: Invalid credentials");

    client
        .send(json!({
            "type": "authenticate",
            "method": "credentials",
            "credentials": {"emailOrUsername": "amy", "password": "secret"}
        }))
        .await;
    let reply = client.recv().await;
    assert_eq!(reply["type"], "login_success");
    assert_eq!(reply["userId"], "u7");
}

#[tokio::test]
async fn test_presence_follows_connections() {
    let server = TestServer::start().await;
    let (mut watcher, _) = server.anonymous_client().await;
    let (other, other_id) = server.anonymous_client().await;

    let online = watcher.recv_type("user_status").await;
    assert_eq!(online["userId"], other_id);
    assert_eq!(online["isOnline"], true);

    other.close().await;
    let offline = watcher.recv_type("user_status").await;
    assert_eq!(offline["userId"], other_id);
    assert_eq!(offline["isOnline"], false);
}

#[tokio::test]
async fn test_public_mood_is_broadcast() {
    let server = TestServer::start().await;
    let (mut author, author_id) = server.anonymous_client().await;
    let (mut reader, _) = server.anonymous_client().await;

    author
        .send(json!({"type": "update_mood", "mood": "great", "isPublic": true}))
        .await;
    author.recv_type("mood_update_success").await;

    let event = reader.recv_type("mood_update").await;
    assert_eq!(event["userId"], author_id);
    assert_eq!(event["mood"]["value"], "great");
}

#[tokio::test]
async fn test_idle_connection_is_swept() {
    let realtime = RealtimeConfig {
        idle_timeout_seconds: 1,
        sweep_interval_seconds: 1,
        ..RealtimeConfig::default()
    };
    let server = TestServer::start_with(MockBackend::new(), realtime).await;
    let mut client = server.client().await;

    let frame = client.recv_close().await.expect("close frame");
    assert_eq!(u16::from(frame.code), 1000);
    assert_eq!(frame.reason.as_str(), "Inactive timeout");
    assert_eq!(server.engine.metrics.snapshot().connections_swept, 1);
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    server.engine.shutdown();

    let frame = client.recv_close().await.expect("close frame");
    assert_eq!(u16::from(frame.code), 1001);
    client.expect_silence(Duration::from_millis(100)).await;
}
