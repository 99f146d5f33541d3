//! `ClientWrapper`: the room layer's view of one connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{ConnectionId, RawSend, TransportError};

/// An event redelivered from a connection to its subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A data frame from the client.
    Message(Vec<u8>),
    /// The connection ended with this close code. Delivered at most once.
    Close(u16),
}

/// Wraps one connection and exposes `send`, `close` and event subscription.
///
/// Cheap to clone; all clones refer to the same connection. Exactly one
/// wrapper is created per accepted connection.
///
/// Events are pushed to a single subscriber (see [`subscribe`](Self::subscribe)).
/// With no subscriber, events are dropped rather than buffered. Once the
/// connection is closed, either by [`close`](Self::close) or by a delivered
/// [`ClientEvent::Close`], the wrapper emits nothing further.
#[derive(Clone)]
pub struct ClientWrapper {
    inner: Arc<Inner>,
}

struct Inner {
    id: ConnectionId,
    sink: Arc<dyn RawSend>,
    subscriber: Mutex<Option<mpsc::UnboundedSender<ClientEvent>>>,
    closed: AtomicBool,
}

impl ClientWrapper {
    /// Creates a wrapper that sends through `sink`.
    pub fn new(id: ConnectionId, sink: Arc<dyn RawSend>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                sink,
                subscriber: Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the identity of the wrapped connection.
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Registers interest in this connection's events.
    ///
    /// Replaces any previous subscriber. Events emitted before this call
    /// are not replayed.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ClientEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.subscriber.lock() = Some(tx);
        rx
    }

    /// Forwards an event to the subscriber.
    ///
    /// Returns `true` if the event was delivered. A `Close` event marks the
    /// wrapper closed, so a second `Close` is never delivered.
    pub fn emit(&self, event: ClientEvent) -> bool {
        let is_close = matches!(event, ClientEvent::Close(_));
        if is_close {
            if self.inner.closed.swap(true, Ordering::AcqRel) {
                return false;
            }
        } else if self.is_closed() {
            return false;
        }

        let mut subscriber = self.inner.subscriber.lock();
        let delivered = match subscriber.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        };
        if is_close {
            subscriber.take();
        }
        delivered
    }

    /// Sends raw bytes to the client.
    ///
    /// # Errors
    /// [`TransportError::ConnectionClosed`] if the connection is closed or
    /// closing. Callers decide whether that matters.
    pub fn send(&self, data: Vec<u8>) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed(format!(
                "{} is closed",
                self.inner.id
            )));
        }
        self.inner.sink.send_raw(data)
    }

    /// Requests termination of the connection.
    ///
    /// Detaches the subscriber immediately. Closing an already closed
    /// wrapper is a no-op.
    pub fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.inner.subscriber.lock().take();
        tracing::debug!(conn_id = %self.inner.id, code, reason, "closing connection");
        self.inner.sink.close(code, reason)
    }

    /// Returns `true` once the connection is closed or closing.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ClientWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientWrapper")
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
