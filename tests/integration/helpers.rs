//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use hugmood_api::{AppState, build_app};
use hugmood_core::config::{AppConfig, RealtimeConfig};
use hugmood_realtime::GatewayEngine;
use hugmood_services::mock::MockBackend;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A gateway served on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub engine: GatewayEngine,
    pub mock: MockBackend,
    server: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(MockBackend::new(), RealtimeConfig::default()).await
    }

    pub async fn start_with(mock: MockBackend, realtime: RealtimeConfig) -> Self {
        let config = AppConfig {
            realtime,
            ..AppConfig::default()
        };
        let engine = GatewayEngine::new(config.realtime.clone(), mock.backends());
        tokio::spawn(engine.sweeper().run(engine.shutdown_signal()));

        let app = build_app(AppState::new(config, engine.clone()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            engine,
            mock,
            server,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Connect and consume the greeting.
    pub async fn client(&self) -> TestClient {
        let (stream, _) = connect_async(self.ws_url()).await.unwrap();
        let mut client = TestClient { stream };
        let greeting = client.recv().await;
        assert_eq!(greeting["type"], "connection_established");
        client
    }

    /// Connect and log in anonymously; returns the client and its user id.
    pub async fn anonymous_client(&self) -> (TestClient, String) {
        let mut client = self.client().await;
        let user_id = client.login_anonymously().await;
        (client, user_id)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.engine.shutdown();
        self.server.abort();
    }
}

/// A WebSocket client speaking JSON envelopes.
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn send(&mut self, envelope: Value) {
        self.send_raw(&envelope.to_string()).await;
    }

    pub async fn send_raw(&mut self, raw: &str) {
        self.stream
            .send(Message::Text(raw.to_string().into()))
            .await
            .unwrap();
    }

    /// Next text envelope; fails on timeout or close.
    pub async fn recv(&mut self) -> Value {
        loop {
            let message = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for a message")
                .expect("stream ended")
                .unwrap();
            match message {
                Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Skip envelopes until one of type `kind` arrives.
    pub async fn recv_type(&mut self, kind: &str) -> Value {
        loop {
            let envelope = self.recv().await;
            if envelope["type"] == kind {
                return envelope;
            }
        }
    }

    /// Wait for the server's close frame.
    pub async fn recv_close(&mut self) -> Option<CloseFrame> {
        loop {
            let message = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for close")?;
            match message {
                Ok(Message::Close(frame)) => return frame,
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Assert nothing arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(Ok(message))) = tokio::time::timeout(window, self.stream.next()).await {
            panic!("expected no message, got {message:?}");
        }
    }

    pub async fn login_anonymously(&mut self) -> String {
        self.send(json!({"type": "authenticate", "method": "anonymous", "callbackId": "login"}))
            .await;
        let reply = self.recv_type("anonymous_login_success").await;
        assert_eq!(reply["callbackId"], "login");
        reply["userId"].as_str().unwrap().to_string()
    }

    pub async fn close(mut self) {
        self.stream.close(None).await.unwrap();
    }
}
