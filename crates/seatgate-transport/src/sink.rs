//! The outbound half of a connection.
//!
//! A [`ClientWrapper`](crate::ClientWrapper) never touches the socket
//! directly. It pushes frames into something that implements [`RawSend`],
//! and a per-connection writer task drains them onto the wire. That keeps
//! `send` synchronous and lets behavior be layered on at construction time:
//! [`Latency`] wraps any `RawSend` and delays every frame by a fixed amount.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::{ConnectionId, TransportError};

/// A frame queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Raw bytes to send as a binary frame.
    Data(Vec<u8>),
    /// Close the connection with this code and reason.
    Close { code: u16, reason: String },
}

/// Something that can push outbound frames towards one connection.
pub trait RawSend: Send + Sync + 'static {
    /// Queues raw bytes for delivery.
    ///
    /// # Errors
    /// [`TransportError::ConnectionClosed`] if the connection's writer is
    /// gone.
    fn send_raw(&self, data: Vec<u8>) -> Result<(), TransportError>;

    /// Requests termination of the connection.
    fn close(&self, code: u16, reason: &str) -> Result<(), TransportError>;
}

/// Channel-backed [`RawSend`] feeding a connection's writer task.
#[derive(Debug, Clone)]
pub struct Outbox {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl Outbox {
    /// Creates an outbox and the receiver its writer task should drain.
    pub fn channel(
        id: ConnectionId,
    ) -> (Self, mpsc::UnboundedReceiver<Outgoing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    fn push(&self, out: Outgoing) -> Result<(), TransportError> {
        self.tx.send(out).map_err(|_| {
            TransportError::ConnectionClosed(format!(
                "{} writer has stopped",
                self.id
            ))
        })
    }
}

impl RawSend for Outbox {
    fn send_raw(&self, data: Vec<u8>) -> Result<(), TransportError> {
        self.push(Outgoing::Data(data))
    }

    fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        self.push(Outgoing::Close {
            code,
            reason: reason.to_string(),
        })
    }
}

/// A [`RawSend`] decorator that delays every frame by a fixed duration.
///
/// Frames (including the close request) leave in the order they were
/// queued. Used to simulate network latency in development.
///
/// Must be created inside a Tokio runtime: construction spawns the task
/// that releases delayed frames.
pub struct Latency {
    delay: Duration,
    tx: mpsc::UnboundedSender<(Instant, Outgoing)>,
}

impl Latency {
    /// Wraps `inner`, delaying each frame by `delay`.
    pub fn new(inner: Arc<dyn RawSend>, delay: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Instant, Outgoing)>();

        tokio::spawn(async move {
            while let Some((due, out)) = rx.recv().await {
                tokio::time::sleep_until(due).await;
                let result = match out {
                    Outgoing::Data(data) => inner.send_raw(data),
                    Outgoing::Close { code, reason } => {
                        inner.close(code, &reason)
                    }
                };
                if let Err(e) = result {
                    tracing::debug!(error = %e, "dropping delayed frame");
                }
            }
        });

        Self { delay, tx }
    }

    /// Returns the configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn push(&self, out: Outgoing) -> Result<(), TransportError> {
        self.tx.send((Instant::now() + self.delay, out)).map_err(|_| {
            TransportError::ConnectionClosed("latency queue closed".into())
        })
    }
}

impl RawSend for Latency {
    fn send_raw(&self, data: Vec<u8>) -> Result<(), TransportError> {
        self.push(Outgoing::Data(data))
    }

    fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        self.push(Outgoing::Close {
            code,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_send_raw_queues_data() {
        let (outbox, mut rx) = Outbox::channel(ConnectionId::new(1));

        outbox.send_raw(b"hi".to_vec()).unwrap();

        assert_eq!(rx.try_recv().unwrap(), Outgoing::Data(b"hi".to_vec()));
    }

    #[test]
    fn test_outbox_close_queues_close_frame() {
        let (outbox, mut rx) = Outbox::channel(ConnectionId::new(1));

        outbox.close(4002, "bye").unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            Outgoing::Close {
                code: 4002,
                reason: "bye".into()
            }
        );
    }

    #[test]
    fn test_outbox_send_after_writer_dropped_returns_closed() {
        let (outbox, rx) = Outbox::channel(ConnectionId::new(9));
        drop(rx);

        let result = outbox.send_raw(vec![1]);

        assert!(matches!(result, Err(TransportError::ConnectionClosed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_holds_frames_until_delay_elapses() {
        let (outbox, mut rx) = Outbox::channel(ConnectionId::new(1));
        let latency = Latency::new(Arc::new(outbox), Duration::from_millis(200));

        latency.send_raw(b"a".to_vec()).unwrap();
        latency.send_raw(b"b".to_vec()).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err(), "nothing should arrive early");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(rx.recv().await.unwrap(), Outgoing::Data(b"a".to_vec()));
        assert_eq!(rx.recv().await.unwrap(), Outgoing::Data(b"b".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_keeps_close_behind_pending_data() {
        let (outbox, mut rx) = Outbox::channel(ConnectionId::new(1));
        let latency = Latency::new(Arc::new(outbox), Duration::from_millis(50));

        latency.send_raw(b"last words".to_vec()).unwrap();
        latency.close(1000, "done").unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            Outgoing::Data(b"last words".to_vec())
        );
        assert!(matches!(rx.recv().await.unwrap(), Outgoing::Close { code: 1000, .. }));
    }
}
