//! `Client`: a session id bound to one connection.
//!
//! The onboarder builds a `Client` once a seat reservation checks out and
//! hands it to the room's join procedure. The room keeps it for as long as
//! the player is present and uses it to talk to the player: raw sends,
//! framework frames, errors, and leaving.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;

use seatgate_protocol::{Codec, ErrorCode, JsonCodec, ServerMessage};
use seatgate_transport::{close_code, ClientEvent, ClientWrapper, ConnectionId};

use crate::SessionError;

/// Where a client is in the join handshake.
///
/// ```text
///   Joining ──(confirm_join)──→ Joined ──(leave)──→ Leaving
///      │                                               ↑
///      └──(mark_reconnected)──→ Reconnected ───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Socket is open, the room hasn't confirmed the join yet.
    Joining,
    /// The room accepted the client.
    Joined,
    /// The client came back on a reconnection seat.
    Reconnected,
    /// The server is closing the client's socket.
    Leaving,
}

/// A session id coupled with the connection's [`ClientWrapper`].
///
/// Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    session_id: String,
    wrapper: ClientWrapper,
    join: Mutex<JoinState>,
}

struct JoinState {
    state: ClientState,
    /// Frames queued with `enqueue_raw` while still joining.
    pending: Vec<Vec<u8>>,
}

impl Client {
    /// Creates a client in the `Joining` state.
    pub fn new(session_id: impl Into<String>, wrapper: ClientWrapper) -> Self {
        Self {
            inner: Arc::new(Inner {
                session_id: session_id.into(),
                wrapper,
                join: Mutex::new(JoinState {
                    state: ClientState::Joining,
                    pending: Vec::new(),
                }),
            }),
        }
    }

    /// The session id this client joined with.
    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// Identity of the underlying connection.
    pub fn id(&self) -> ConnectionId {
        self.inner.wrapper.id()
    }

    /// The connection wrapper.
    pub fn wrapper(&self) -> &ClientWrapper {
        &self.inner.wrapper
    }

    /// Current handshake state.
    pub fn state(&self) -> ClientState {
        self.inner.join.lock().state
    }

    /// Subscribes to this client's messages and close event.
    ///
    /// See [`ClientWrapper::subscribe`]: the latest subscriber wins.
    pub fn events(&self) -> mpsc::UnboundedReceiver<ClientEvent> {
        self.inner.wrapper.subscribe()
    }

    /// Sends raw bytes immediately.
    pub fn send_raw(&self, data: Vec<u8>) -> Result<(), SessionError> {
        self.inner.wrapper.send(data).map_err(SessionError::from)
    }

    /// Sends raw bytes, or queues them if the client is still joining.
    ///
    /// Queued frames go out, in order, when the join is confirmed.
    pub fn enqueue_raw(&self, data: Vec<u8>) -> Result<(), SessionError> {
        {
            let mut join = self.inner.join.lock();
            if join.state == ClientState::Joining {
                join.pending.push(data);
                return Ok(());
            }
        }
        self.send_raw(data)
    }

    /// Encodes `value` with `codec` and sends it.
    pub fn send<T: Serialize>(
        &self,
        codec: &impl Codec,
        value: &T,
    ) -> Result<(), SessionError> {
        let bytes = codec.encode(value)?;
        self.send_raw(bytes)
    }

    /// Tells the client it is in, then flushes anything queued while it
    /// was joining.
    pub fn confirm_join(
        &self,
        reconnection_token: &str,
    ) -> Result<(), SessionError> {
        self.send(
            &JsonCodec,
            &ServerMessage::JoinRoom {
                reconnection_token: reconnection_token.to_string(),
            },
        )?;

        let pending = {
            let mut join = self.inner.join.lock();
            join.state = ClientState::Joined;
            std::mem::take(&mut join.pending)
        };
        tracing::debug!(
            session_id = %self.inner.session_id,
            queued = pending.len(),
            "client joined"
        );
        for frame in pending {
            self.send_raw(frame)?;
        }
        Ok(())
    }

    /// Marks the client as having rejoined on a reconnection seat.
    pub fn mark_reconnected(&self) {
        self.inner.join.lock().state = ClientState::Reconnected;
    }

    /// Sends an error frame to the client.
    pub fn error(&self, code: ErrorCode, message: &str) -> Result<(), SessionError> {
        self.send(
            &JsonCodec,
            &ServerMessage::Error {
                code,
                message: message.to_string(),
            },
        )
    }

    /// Closes the client's socket with `code`.
    pub fn leave(&self, code: u16) -> Result<(), SessionError> {
        self.inner.join.lock().state = ClientState::Leaving;
        self.inner
            .wrapper
            .close(code, "")
            .map_err(SessionError::from)
    }

    /// Sends an error frame and then closes the socket.
    ///
    /// The close is attempted even if the error frame can't be sent.
    pub fn reject(&self, code: ErrorCode, message: &str) -> Result<(), SessionError> {
        let sent = self.error(code, message);
        self.inner.join.lock().state = ClientState::Leaving;
        self.inner.wrapper.close(close_code::WITH_ERROR, message)?;
        sent
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session_id", &self.inner.session_id)
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}
