//! Send capability of one live transport.

use tokio::sync::mpsc;

/// A unit queued for the transport writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Encoded envelope.
    Text(String),
    /// Close the transport with a status code.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Server going away.
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// Non-blocking sender half of a connection's outbound queue.
///
/// The transport task owns the receiver and writes frames to the socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    sender: mpsc::Sender<Frame>,
}

impl ConnectionHandle {
    /// Wrap an existing sender.
    pub fn new(sender: mpsc::Sender<Frame>) -> Self {
        Self { sender }
    }

    /// Create a handle and the receiver the transport writer drains.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    /// Queue a frame. Returns `false` if it was dropped.
    pub fn send(&self, frame: Frame) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Outbound buffer full, dropping frame");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Queue a text frame.
    pub fn send_text(&self, text: String) -> bool {
        self.send(Frame::Text(text))
    }

    /// Queue a close frame.
    pub fn close(&self, code: u16, reason: &str) -> bool {
        self.send(Frame::Close {
            code,
            reason: reason.to_string(),
        })
    }

    /// Whether the transport writer is still draining the queue.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_reaches_receiver() {
        let (handle, mut rx) = ConnectionHandle::channel(4);
        assert!(handle.send_text("hi".into()));
        assert_eq!(rx.recv().await, Some(Frame::Text("hi".into())));
    }

    #[tokio::test]
    async fn test_full_buffer_drops() {
        let (handle, _rx) = ConnectionHandle::channel(1);
        assert!(handle.send_text("a".into()));
        assert!(!handle.send_text("b".into()));
    }

    #[tokio::test]
    async fn test_closed_receiver() {
        let (handle, rx) = ConnectionHandle::channel(1);
        drop(rx);
        assert!(!handle.is_open());
        assert!(!handle.close(CLOSE_NORMAL, "bye"));
    }
}
