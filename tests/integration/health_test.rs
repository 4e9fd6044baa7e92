//! Integration tests for the health probe.

mod helpers;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use hugmood_api::{AppState, build_app};
use hugmood_core::config::AppConfig;
use hugmood_realtime::GatewayEngine;
use hugmood_services::mock::MockBackend;

use helpers::TestServer;

async fn get_json(app: axum::Router, path: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let config = AppConfig::default();
    let engine = GatewayEngine::new(config.realtime.clone(), MockBackend::new().backends());
    let (status, body) = get_json(build_app(AppState::new(config, engine)), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["clients"], 0);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_detailed_health_counts_live_clients() {
    let server = TestServer::start().await;
    let (_client, _) = server.anonymous_client().await;
    let _anonymous = server.client().await;

    let app = build_app(AppState::new(AppConfig::default(), server.engine.clone()));
    let (status, body) = get_json(app, "/health/detailed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clients"], 2);
    assert_eq!(body["authenticatedClients"], 1);
    assert_eq!(body["onlineUsers"], 1);
    assert_eq!(body["metrics"]["connectionsTotal"], 2);
}
