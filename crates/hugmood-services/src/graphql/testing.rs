//! One-route HTTP stub standing in for a GraphQL backend.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::GraphqlClient;

/// A request as seen by the stub.
#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

pub(crate) struct StubBackend {
    pub url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubBackend {
    /// Answer every POST with `response`.
    pub async fn start(response: Value) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/graphql", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let payload = response.to_string();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                if let Some(request) = read_request(&mut socket).await {
                    log.lock().unwrap().push(request);
                }
                let reply = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    payload.len(),
                    payload
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { url, seen }
    }

    pub fn client(&self) -> GraphqlClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        GraphqlClient::new(&self.url, http)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let header = |name: &str| {
            head.lines().find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case(name)
                    .then(|| value.trim().to_string())
            })
        };
        let length: usize = header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let body_start = head_end + 4;
        if buf.len() < body_start + length {
            continue;
        }
        return Some(SeenRequest {
            authorization: header("authorization"),
            body: serde_json::from_slice(&buf[body_start..body_start + length])
                .unwrap_or(Value::Null),
        });
    }
}
