//! WebSocket upgrade handler.
//!
//! Connections start unauthenticated; identity is established in-band with
//! an `authenticate` request.

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use hugmood_realtime::{Frame, GatewayEngine};

use crate::state::AppState;

/// GET {ws_path}: WebSocket upgrade
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state.engine, socket))
}

/// Pumps one established socket until either side closes.
async fn handle_ws_connection(engine: GatewayEngine, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (conn_id, mut outbound_rx) = engine.connect();

    // Outbound forwarder; exits after writing a close frame.
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            match frame {
                Frame::Text(text) => {
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Frame::Close { code, reason } => {
                    let close = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    let _ = ws_tx.send(Message::Close(Some(close))).await;
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    engine.handle_text(conn_id, text.as_str());
                }
                Some(Ok(Message::Binary(data))) => {
                    engine.handle_text(conn_id, &String::from_utf8_lossy(&data));
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong are answered by the transport.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = &mut writer => {
                debug!(conn_id = %conn_id, "Outbound stream ended");
                break;
            }
        }
    }

    writer.abort();
    engine.disconnect(conn_id);
}
